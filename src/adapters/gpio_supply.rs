//! Supply enable line driven by a GPIO.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::app::ports::PowerSupply;
use crate::error::PowerError;

pub struct GpioSupply<PIN> {
    pin: PIN,
    active_low: bool,
}

impl<PIN: OutputPin> GpioSupply<PIN> {
    /// Supply switched on by driving the pin high.
    pub fn new(pin: PIN) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// Supply switched on by driving the pin low.
    pub fn active_low(pin: PIN) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }
}

impl<PIN: OutputPin> PowerSupply for GpioSupply<PIN> {
    fn enable(&mut self, on: bool) -> Result<(), PowerError> {
        debug!("supply enable line -> {}", on);
        let result = if on != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| {
            if on {
                PowerError::EnableFailed
            } else {
                PowerError::DisableFailed
            }
        })
    }
}
