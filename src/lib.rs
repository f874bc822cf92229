//! AW2013 three-channel LED controller driver.
//!
//! Exposes the chip as independent red, green and blue channels (plus a
//! white alias with no output path). Channel setters only update state
//! and enqueue work; a single worker thread turns each request into a
//! register program and runs it on the bus, so programs never interleave.
//!
//! All hardware access goes through the port traits in [`app::ports`];
//! [`adapters`] provides implementations over `embedded-hal`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channels;
pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod serializer;

pub use app::service::{ChannelHandle, LedDevice};
pub use channels::{ChannelState, Color};
pub use config::{ChannelDescriptor, DeviceConfig, DriverConfig};
pub use error::{Error, Result};
