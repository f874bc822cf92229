//! Driver configuration.
//!
//! [`DriverConfig`] holds the tunable timings of attach; [`DeviceConfig`]
//! adds the channel descriptors enumerated from the board description.
//! Both deserialize from JSON so a board file can be embedded in the
//! firmware image.

use heapless::Vec as FixedVec;
use serde::{Deserialize, Serialize};

use crate::channels::Color;
use crate::error::{Error, Result};

/// Most channels a single chip can expose (R, G, B and the white alias).
pub const MAX_CHANNELS: usize = Color::COUNT;

/// Attach-time tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// 7-bit I2C address of the chip.
    pub bus_address: u8,
    /// Liveness probe attempts before attach gives up.
    pub probe_attempts: u8,
    /// Wait before each probe attempt (milliseconds).
    pub probe_interval_ms: u32,
    /// Settling time after the supply is switched on (milliseconds).
    pub power_settle_ms: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            bus_address: 0x45,
            probe_attempts: 5,
            probe_interval_ms: 10,
            power_settle_ms: 100,
        }
    }
}

/// One channel as described by the board configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    /// Channel name; selects the color (`red`, `green`, `blue`, `white`).
    #[serde(alias = "label")]
    pub name: String,
    /// Trigger the host framework attaches by default.
    #[serde(default)]
    pub default_trigger: Option<String>,
    /// Keep the channel lit across system suspend.
    #[serde(default)]
    pub retain_state_suspended: bool,
}

impl ChannelDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            default_trigger: None,
            retain_state_suspended: false,
        }
    }

    pub fn with_trigger(mut self, trigger: &str) -> Self {
        self.default_trigger = Some(trigger.into());
        self
    }

    pub fn color(&self) -> Option<Color> {
        Color::from_name(&self.name)
    }
}

/// Full device description handed to attach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    pub channels: Vec<ChannelDescriptor>,
}

impl DeviceConfig {
    pub fn new(channels: Vec<ChannelDescriptor>) -> Self {
        Self {
            driver: DriverConfig::default(),
            channels,
        }
    }

    /// The common board layout: red, green and blue.
    pub fn rgb() -> Self {
        Self::new(
            ["red", "green", "blue"]
                .into_iter()
                .map(ChannelDescriptor::new)
                .collect(),
        )
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            log::warn!("device config rejected: {}", e);
            Error::Configuration("malformed device configuration")
        })
    }

    /// Check the description and resolve each channel's color, in
    /// descriptor order.
    pub fn validate(&self) -> Result<FixedVec<Color, MAX_CHANNELS>> {
        if self.driver.probe_attempts == 0 {
            return Err(Error::Configuration("probe_attempts must be at least 1"));
        }
        if self.channels.is_empty() {
            return Err(Error::Configuration("no channels described"));
        }
        if self.channels.len() > MAX_CHANNELS {
            return Err(Error::Configuration("more channels than the chip provides"));
        }

        let mut colors = FixedVec::new();
        for ch in &self.channels {
            let color = ch
                .color()
                .ok_or(Error::Configuration("unknown channel name"))?;
            if colors.contains(&color) {
                return Err(Error::Configuration("channel described twice"));
            }
            colors
                .push(color)
                .map_err(|_| Error::Configuration("more channels than the chip provides"))?;
        }
        Ok(colors)
    }
}
