//! AW2013 register protocol.
//!
//! [`registers`] holds the register map and the fixed values the driver
//! programs; [`encoder`] turns a desired output into an ordered
//! [`Program`](encoder::Program) of register writes and settling delays.

pub mod encoder;
pub mod registers;

pub use encoder::{OutputRequest, Program, ProgramKind, Step, encode};
