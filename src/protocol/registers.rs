//! AW2013 register map.
//!
//! Only the registers the driver writes are listed. Channel-indexed
//! registers are laid out as three consecutive addresses (R, G, B).

// ── Addresses ─────────────────────────────────────────────────

/// Reset / mode register. Writing [`RSTR_RESET`] resets the chip.
pub const RSTR: u8 = 0x00;
/// Global control register.
pub const GCR: u8 = 0x01;
/// LED channel enable register (one bit per channel).
pub const LCTR: u8 = 0x30;
/// Per-channel mode registers.
pub const LCFG: [u8; 3] = [0x31, 0x32, 0x33];
/// Per-channel PWM (maximum output) registers.
pub const PWM: [u8; 3] = [0x34, 0x35, 0x36];
/// Per-channel rise/hold timing registers.
pub const T0: [u8; 3] = [0x37, 0x3a, 0x3d];
/// Per-channel fall/off timing registers.
pub const T1: [u8; 3] = [0x38, 0x3b, 0x3e];
/// Per-channel delay/period registers.
pub const T2: [u8; 3] = [0x39, 0x3c, 0x3f];

// ── Values ────────────────────────────────────────────────────

/// Software reset. Also the liveness probe write.
pub const RSTR_RESET: u8 = 0x55;
/// Selects breathing operation before a blink program.
pub const RSTR_BREATHE: u8 = 0x54;

pub const GCR_OFF: u8 = 0x00;
/// Chip enable, interrupts masked. Used during bring-up.
pub const GCR_ENABLE: u8 = 0x01;
/// Chip enable with the interrupt sources armed.
pub const GCR_RUN: u8 = 0xe1;

pub const LCTR_OFF: u8 = 0x00;
/// All three channel outputs on.
pub const LCTR_ALL: u8 = 0x07;

/// Fade-out, fade-in, 5 mA output current.
pub const LCFG_BASE: u8 = 0x61;
/// Pattern (breathing) mode bit.
pub const LCFG_BREATHE: u8 = 0x10;

pub const PWM_OFF: u8 = 0;
pub const PWM_MAX: [u8; 3] = [255, 255, 255];

// ── Breathing timing (fixed) ──────────────────────────────────

pub const RISE_T: u8 = 0x02;
pub const HOLD_T: u8 = 0x03;
pub const FALL_T: u8 = 0x02;
pub const OFF_T: u8 = 0x03;
pub const DELAY_T: u8 = 0x00;
pub const PERIOD_NUM: u8 = 0x00;

pub const T0_VALUE: u8 = (RISE_T << 4) | HOLD_T;
pub const T1_VALUE: u8 = (FALL_T << 4) | OFF_T;
pub const T2_VALUE: u8 = (DELAY_T << 4) | PERIOD_NUM;

// ── Settling delays ───────────────────────────────────────────

/// After the bring-up writes.
pub const BRING_UP_SETTLE_MS: u32 = 1;
/// After the final channel-enable write of a light program.
pub const ENABLE_SETTLE_MS: u32 = 1;
/// After disabling outputs, and again after zeroing PWM, on power-down.
pub const POWER_DOWN_SETTLE_MS: u32 = 1;
