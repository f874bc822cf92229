//! Fuzz target: board description parser
//!
//! Feeds arbitrary bytes to `DeviceConfig::from_json` and validates
//! whatever parses, verifying:
//! - No panics under arbitrary input
//! - A validated layout never exceeds the chip's channel count
//! - Validated colors are unique
//!
//! cargo fuzz run fuzz_board_config

#![no_main]

use aw2013::config::{DeviceConfig, MAX_CHANNELS};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(cfg) = DeviceConfig::from_json(text) else {
        return;
    };
    if let Ok(colors) = cfg.validate() {
        assert!(!colors.is_empty() && colors.len() <= MAX_CHANNELS);
        for (i, c) in colors.iter().enumerate() {
            assert!(!colors[i + 1..].contains(c), "duplicate {}", c);
        }
    }
});
