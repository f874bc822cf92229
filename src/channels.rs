//! Per-color channel state and the exclusivity rule.
//!
//! The store is pure bookkeeping: it never touches the bus. It lives
//! inside the device core, so every mutation below happens while the
//! caller holds the core's exclusion lock.
//!
//! ## Exclusivity
//!
//! At most one of RED, GREEN and BLUE is lit at any committed state.
//! Writing any of them forces the other two to brightness 0 (and clears
//! their blink flag, since the chip has no dim blink mode). WHITE is
//! tracked but takes no part in exclusivity.

use core::fmt;

/// Brightness value of a fully lit channel.
pub const MAX_BRIGHTNESS: u8 = 255;

/// One controllable color path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Green = 1,
    Blue = 2,
    /// Accepted as an identity; the chip has no output wired for it.
    White = 3,
}

impl Color {
    /// Total number of colors — used to size the state table.
    pub const COUNT: usize = 4;

    /// The mutually exclusive hardware colors.
    pub const RGB: [Color; 3] = [Color::Red, Color::Green, Color::Blue];

    /// Every color, in table order.
    pub const ALL: [Color; Color::COUNT] = [Color::Red, Color::Green, Color::Blue, Color::White];

    /// Resolve a channel name from the device configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            "white" => Some(Self::White),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::White => "white",
        }
    }

    /// Whether this color participates in RGB exclusivity.
    pub const fn is_rgb(self) -> bool {
        !matches!(self, Self::White)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Brightness and blink intent for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelState {
    pub brightness: u8,
    pub blinking: bool,
    /// Requested on-time of a blink cycle. Stored only; the chip is
    /// programmed with fixed timing.
    pub on_time_ms: u32,
    /// Requested off-time of a blink cycle. Stored only.
    pub off_time_ms: u32,
}

impl ChannelState {
    pub fn is_lit(&self) -> bool {
        self.brightness > 0
    }
}

/// Per-color state table.
#[derive(Debug, Clone, Default)]
pub struct ChannelStore {
    channels: [ChannelState; Color::COUNT],
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a steady brightness. Any blink on this channel is cancelled.
    pub fn set_brightness(&mut self, color: Color, value: u8) {
        self.silence_others(color);
        let ch = &mut self.channels[color.index()];
        ch.brightness = value;
        ch.blinking = false;
    }

    /// Start blinking at full brightness with the requested timing.
    pub fn set_blink(&mut self, color: Color, on_ms: u32, off_ms: u32) {
        self.silence_others(color);
        let ch = &mut self.channels[color.index()];
        ch.brightness = MAX_BRIGHTNESS;
        ch.blinking = true;
        ch.on_time_ms = on_ms;
        ch.off_time_ms = off_ms;
    }

    /// The boolean `blink` attribute: on means full-brightness blink,
    /// off means dark. Timing is left as it was.
    pub fn set_blink_enabled(&mut self, color: Color, enabled: bool) {
        self.silence_others(color);
        let ch = &mut self.channels[color.index()];
        ch.brightness = if enabled { MAX_BRIGHTNESS } else { 0 };
        ch.blinking = enabled;
    }

    pub fn get(&self, color: Color) -> ChannelState {
        self.channels[color.index()]
    }

    pub fn brightness(&self, color: Color) -> u8 {
        self.channels[color.index()].brightness
    }

    pub fn blinking(&self, color: Color) -> bool {
        self.channels[color.index()].blinking
    }

    /// Whether any RGB channel is currently lit.
    pub fn any_rgb_lit(&self) -> bool {
        Color::RGB.iter().any(|&c| self.channels[c.index()].is_lit())
    }

    fn silence_others(&mut self, color: Color) {
        if !color.is_rgb() {
            return;
        }
        for other in Color::RGB {
            if other != color {
                let ch = &mut self.channels[other.index()];
                ch.brightness = 0;
                ch.blinking = false;
            }
        }
    }
}
