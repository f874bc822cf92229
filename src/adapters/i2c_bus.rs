//! I2C register bus adapter.
//!
//! Each register write is one SMBus "write byte data" transfer: the
//! register address followed by the value, to the chip's 7-bit address.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::app::ports::RegisterBus;
use crate::error::BusError;

pub struct I2cRegisterBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cRegisterBus<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the underlying bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterBus for I2cRegisterBus<I2C> {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|e| match e.kind() {
                ErrorKind::NoAcknowledge(_) => BusError::NoAcknowledge,
                ErrorKind::ArbitrationLoss => BusError::ArbitrationLoss,
                _ => BusError::Other,
            })
    }
}
