//! Unified error types for the AW2013 driver.
//!
//! A single `Error` enum that every subsystem converts into. Attach-time
//! failures are returned to the caller; runtime bus failures inside a
//! programming job are logged and counted instead (see
//! [`DeviceController::execute`](crate::device::DeviceController::execute)).
//! All variants are `Copy` so they can cross the worker thread boundary
//! and be recorded by mocks without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible operation in the driver funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A register write on the serial bus failed.
    Bus(BusError),
    /// The analog supply could not be switched.
    Power(PowerError),
    /// The chip did not acknowledge any liveness probe.
    ProbeFailure { attempts: u8 },
    /// A resource could not be allocated while attaching.
    AllocationFailure(&'static str),
    /// The channel configuration is empty or malformed.
    Configuration(&'static str),
    /// A caller-supplied value could not be parsed.
    InvalidArgument(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Power(e) => write!(f, "power: {e}"),
            Self::ProbeFailure { attempts } => {
                write!(f, "device did not respond after {attempts} attempts")
            }
            Self::AllocationFailure(what) => write!(f, "allocation failed: {what}"),
            Self::Configuration(msg) => write!(f, "config: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The device did not acknowledge its address or a data byte.
    NoAcknowledge,
    /// Arbitration was lost to another bus master.
    ArbitrationLoss,
    /// Any other transport-level failure.
    Other,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAcknowledge => write!(f, "no acknowledge"),
            Self::ArbitrationLoss => write!(f, "arbitration lost"),
            Self::Other => write!(f, "transfer failed"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Power errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    /// The supply refused to turn on.
    EnableFailed,
    /// The supply refused to turn off.
    DisableFailed,
}

impl fmt::Display for PowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnableFailed => write!(f, "supply enable failed"),
            Self::DisableFailed => write!(f, "supply disable failed"),
        }
    }
}

impl From<PowerError> for Error {
    fn from(e: PowerError) -> Self {
        Self::Power(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
