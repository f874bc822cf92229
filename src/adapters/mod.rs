//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter       | Implements    | Connects to                     |
//! |---------------|---------------|---------------------------------|
//! | `i2c_bus`     | RegisterBus   | any `embedded_hal::i2c::I2c`    |
//! | `gpio_supply` | PowerSupply   | any `embedded_hal` output pin   |
//! | `delay`       | DelayNs       | `std::thread::sleep`            |
//! | `led_registry`| LedClassPort  | in-process name registry        |
//! | `log_sink`    | EventSink     | `log` facade                    |

pub mod delay;
pub mod gpio_supply;
pub mod i2c_bus;
pub mod led_registry;
pub mod log_sink;
