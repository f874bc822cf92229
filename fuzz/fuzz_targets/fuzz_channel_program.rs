//! Fuzz target: channel store → register encoder
//!
//! Drives arbitrary setter sequences through `ChannelStore` and encodes
//! the latest request after each one, verifying:
//! - No panics under arbitrary byte inputs
//! - At most one RGB channel is lit after every operation
//! - Every non-empty program ends in a settle delay
//! - Dark requests always encode the power-down program
//!
//! cargo fuzz run fuzz_channel_program

#![no_main]

use aw2013::channels::{ChannelStore, Color};
use aw2013::protocol::{OutputRequest, ProgramKind, Step, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut store = ChannelStore::new();
    let mut session = false;

    // Three bytes per operation: [opcode|color] [value] [timing]
    for chunk in data.chunks_exact(3) {
        let color = Color::ALL[usize::from(chunk[0] & 0x03)];
        match (chunk[0] >> 2) & 0x03 {
            0 | 1 => store.set_brightness(color, chunk[1]),
            2 => store.set_blink(color, u32::from(chunk[1]) * 10, u32::from(chunk[2]) * 10),
            _ => store.set_blink_enabled(color, chunk[1] & 1 == 1),
        }

        let lit = Color::RGB.iter().filter(|&&c| store.brightness(c) > 0).count();
        assert!(lit <= 1, "{} RGB channels lit", lit);

        let state = store.get(color);
        let program = encode(&OutputRequest::for_channel(color, &state), session);
        match program.kind() {
            ProgramKind::Skip => assert!(program.is_empty()),
            ProgramKind::PowerDown => {
                assert!(!state.is_lit());
                assert_eq!(program.writes().count(), 5);
            }
            ProgramKind::Light { bring_up } => {
                assert!(state.is_lit());
                assert_eq!(bring_up, !session);
            }
        }
        if !program.is_empty() {
            assert!(matches!(program.steps().last(), Some(Step::DelayMs(1))));
        }
        session = program.session_after();
    }
});
