//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured driver events to the
//! `log` facade (the ESP-IDF logger in production, whatever the host
//! installs in tests). A diagnostics adapter would implement the same
//! trait.

use log::{info, warn};

use crate::app::events::DriverEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DriverEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DriverEvent) {
        match event {
            DriverEvent::Attached { channels } => {
                info!("ATTACH | ok, channels={}", channels);
            }
            DriverEvent::AttachFailed(e) => {
                warn!("ATTACH | failed: {}", e);
            }
            DriverEvent::SessionStarted => info!("SESSION | chip initialised"),
            DriverEvent::SessionEnded => info!("SESSION | all outputs off"),
            DriverEvent::ProgramFailed {
                color,
                writes,
                failures,
            } => {
                warn!(
                    "BUS | {} program: {}/{} writes failed",
                    color, failures, writes
                );
            }
            DriverEvent::Detached => info!("DETACH | supply off"),
        }
    }
}
