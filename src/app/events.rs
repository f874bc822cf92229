//! Outbound driver events.
//!
//! The [`LedDevice`](super::service::LedDevice) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them — log to serial, count them in a
//! test, forward them to a diagnostics channel.

use crate::channels::Color;
use crate::error::Error;

/// Structured events emitted by the driver core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// The chip answered the probe and every channel is registered.
    Attached { channels: usize },

    /// Attach gave up; the supply is off and nothing stays registered.
    AttachFailed(Error),

    /// The chip was reset and enabled ahead of a light program.
    SessionStarted,

    /// A power-down program ran; the next light program re-initialises.
    SessionEnded,

    /// A programming job finished with failed register writes.
    ProgramFailed {
        color: Color,
        writes: usize,
        failures: usize,
    },

    /// Channels are unregistered and the supply is off.
    Detached,
}
