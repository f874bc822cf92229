//! Application core — attach/detach orchestration and the channel API.
//!
//! All interaction with the bus, the supply and the host lighting
//! framework happens through the **port traits** in [`ports`], keeping
//! this layer fully testable without a real chip.

pub mod events;
pub mod ports;
pub mod service;
