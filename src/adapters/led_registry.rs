//! In-process LED class registry.
//!
//! Stands in for the host lighting framework on targets without one:
//! it keeps the registered channel names and refuses a name that is
//! already taken, the same way a class device namespace would.

use log::{debug, info};

use crate::app::ports::LedClassPort;
use crate::config::{ChannelDescriptor, MAX_CHANNELS};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct LedRegistry {
    names: heapless::Vec<String, MAX_CHANNELS>,
}

impl LedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl LedClassPort for LedRegistry {
    fn register(&mut self, channel: &ChannelDescriptor) -> Result<()> {
        if self.is_registered(&channel.name) {
            return Err(Error::Configuration("led name already registered"));
        }
        self.names
            .push(channel.name.clone())
            .map_err(|_| Error::AllocationFailure("led registry"))?;
        match &channel.default_trigger {
            Some(trigger) => info!("led {} registered (trigger {})", channel.name, trigger),
            None => info!("led {} registered", channel.name),
        }
        Ok(())
    }

    fn unregister(&mut self, channel: &ChannelDescriptor) {
        self.names.retain(|n| *n != channel.name);
        debug!("led {} unregistered", channel.name);
    }
}
