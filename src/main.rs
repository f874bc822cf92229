//! AW2013 demo firmware — Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Adapters (outer ring)                    │
//! │  I2cRegisterBus  GpioSupply  StdDelay  LedRegistry       │
//! │  (RegisterBus)   (Supply)    (DelayNs) (LedClassPort)    │
//! │  LogEventSink (EventSink)                                │
//! │  ───────────────── Port Trait Boundary ───────────────   │
//! │  LedDevice ─▶ ChannelHandle ×3 ─▶ aw2013-prog worker      │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use log::{info, warn};

use aw2013::adapters::delay::StdDelay;
use aw2013::adapters::gpio_supply::GpioSupply;
use aw2013::adapters::i2c_bus::I2cRegisterBus;
use aw2013::adapters::led_registry::LedRegistry;
use aw2013::adapters::log_sink::LogEventSink;
use aw2013::{Color, DeviceConfig, LedDevice};

/// Board description baked into the image; falls back to plain RGB.
const BOARD_JSON: &str = r#"{
    "channels": [
        { "name": "red", "default_trigger": "none" },
        { "name": "green" },
        { "name": "blue" }
    ]
}"#;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("aw2013 demo v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Board configuration ────────────────────────────────
    let config = DeviceConfig::from_json(BOARD_JSON).unwrap_or_else(|e| {
        warn!("board description rejected ({}), using RGB defaults", e);
        DeviceConfig::rgb()
    });

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )?;
    let supply_pin = PinDriver::output(peripherals.pins.gpio4)?;

    // ── 4. Attach ─────────────────────────────────────────────
    let device = LedDevice::attach(
        &config,
        I2cRegisterBus::new(i2c, config.driver.bus_address),
        GpioSupply::new(supply_pin),
        StdDelay::new(),
        LedRegistry::new(),
        LogEventSink::new(),
    )?;

    // ── 5. Cycle the colors ───────────────────────────────────
    let handles: Vec<_> = Color::RGB
        .into_iter()
        .filter_map(|c| device.channel(c))
        .collect();

    for round in 0..3 {
        for handle in &handles {
            info!("round {}: {}", round, handle.color());
            handle.set_brightness(255);
            std::thread::sleep(Duration::from_secs(1));
        }
        if let Some(first) = handles.first() {
            first.set_blink(500, 500);
            std::thread::sleep(Duration::from_secs(2));
            first.set_brightness(0);
        }
    }

    device.detach()?;
    info!("done");
    Ok(())
}
