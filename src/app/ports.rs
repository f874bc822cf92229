//! Port traits — the boundary between driver logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LedDevice (driver core)
//! ```
//!
//! Driven adapters (bus, supply, host framework, event sinks) implement
//! these traits. The [`LedDevice`](super::service::LedDevice) consumes
//! them via generics, so the core never touches a peripheral directly.
//! Settling delays use [`embedded_hal::delay::DelayNs`] rather than a
//! port of their own.

use crate::config::ChannelDescriptor;
use crate::error::{BusError, Error, PowerError};

// ───────────────────────────────────────────────────────────────
// Register bus (driven adapter: core → chip)
// ───────────────────────────────────────────────────────────────

/// Single-register write access to the chip.
pub trait RegisterBus {
    /// Write `value` into register `reg`.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Analog supply
// ───────────────────────────────────────────────────────────────

/// The enable line of the chip's LED supply.
pub trait PowerSupply {
    fn enable(&mut self, on: bool) -> Result<(), PowerError>;
}

// ───────────────────────────────────────────────────────────────
// Host lighting framework
// ───────────────────────────────────────────────────────────────

/// Registration of one color channel (and its `blink` attribute) with
/// the host lighting framework.
pub trait LedClassPort {
    /// Register the channel. On error nothing is left registered for it.
    fn register(&mut self, channel: &ChannelDescriptor) -> Result<(), Error>;

    /// Remove a previously registered channel.
    fn unregister(&mut self, channel: &ChannelDescriptor);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: core → logging / diagnostics)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`DriverEvent`](super::events::DriverEvent)s
/// through this port. It is called from the programming worker while the
/// device lock is held, so implementations must not block.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::DriverEvent);
}
