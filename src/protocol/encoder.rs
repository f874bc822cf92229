//! Register Protocol Encoder.
//!
//! Maps a desired output (target color, which RGB outputs are on, blink
//! flag) plus the current session flag to the exact, ordered sequence of
//! register writes and settling delays the chip expects.
//!
//! ```text
//!   any RGB on?
//!     ├─ yes ─▶ [breathe] [bring-up + 1ms]? GCR · LCFG×3 · PWM×3 · T0/T1/T2×3 · LCTR + 1ms
//!     └─ no  ─▶ [breathe] GCR=0 + 1ms · LCTR=0 · PWM×3=0 + 1ms
//! ```
//!
//! The encoder is pure: it performs no I/O and owns no state. The new
//! session flag is returned inside the [`Program`] and committed by the
//! [`DeviceController`](crate::device::DeviceController) once the
//! program has run.

use core::ops::Range;

use heapless::Vec;

use crate::channels::{ChannelState, Color};

use super::registers as reg;

/// Longest possible program: breathe (1) + bring-up (3) + light body (17)
/// + final settle (1), with headroom.
pub const MAX_STEPS: usize = 24;

/// One element of a register program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Write `value` into register `reg`.
    Write { reg: u8, value: u8 },
    /// Settle for the given number of milliseconds.
    DelayMs(u32),
}

/// What a program does to the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    /// Light an output; `bring_up` is set when the session was opened.
    Light { bring_up: bool },
    /// Disable outputs and zero brightness; closes the session.
    PowerDown,
    /// Nothing to program for this color.
    Skip,
}

/// An encoded register program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    kind: ProgramKind,
    steps: Vec<Step, MAX_STEPS>,
    /// Step indices of the bring-up sequence, if the program has one.
    bring_up: Option<Range<usize>>,
    session_after: bool,
}

impl Program {
    fn new(kind: ProgramKind, session_after: bool) -> Self {
        Self {
            kind,
            steps: Vec::new(),
            bring_up: None,
            session_after,
        }
    }

    fn write(&mut self, reg: u8, value: u8) {
        self.push(Step::Write { reg, value });
    }

    fn delay_ms(&mut self, ms: u32) {
        self.push(Step::DelayMs(ms));
    }

    fn push(&mut self, step: Step) {
        let pushed = self.steps.push(step).is_ok();
        debug_assert!(pushed, "program exceeds {MAX_STEPS} steps");
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step indices of the bring-up sequence. The session opens once
    /// these writes have gone through.
    pub fn bring_up_steps(&self) -> Option<Range<usize>> {
        self.bring_up.clone()
    }

    /// Session flag to commit after this program has run.
    pub fn session_after(&self) -> bool {
        self.session_after
    }

    /// The register writes only, in order.
    pub fn writes(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.steps.iter().filter_map(|s| match *s {
            Step::Write { reg, value } => Some((reg, value)),
            Step::DelayMs(_) => None,
        })
    }

    /// Total settling time the program asks for.
    pub fn total_delay_ms(&self) -> u32 {
        self.steps
            .iter()
            .map(|s| match *s {
                Step::DelayMs(ms) => ms,
                Step::Write { .. } => 0,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// The desired output for one programming job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRequest {
    pub target: Color,
    pub red_on: bool,
    pub green_on: bool,
    pub blue_on: bool,
    pub blinking: bool,
}

impl OutputRequest {
    /// Build the request for `target` from its channel state. Only the
    /// target's own output can be on.
    pub fn for_channel(target: Color, state: &ChannelState) -> Self {
        let lit = state.is_lit();
        Self {
            target,
            red_on: target == Color::Red && lit,
            green_on: target == Color::Green && lit,
            blue_on: target == Color::Blue && lit,
            blinking: state.blinking,
        }
    }

    pub fn any_on(&self) -> bool {
        self.red_on || self.green_on || self.blue_on
    }
}

/// Encode `req` against the current session flag.
pub fn encode(req: &OutputRequest, session_active: bool) -> Program {
    if !req.target.is_rgb() {
        return Program::new(ProgramKind::Skip, session_active);
    }

    let mut program = if req.any_on() {
        Program::new(
            ProgramKind::Light {
                bring_up: !session_active,
            },
            true,
        )
    } else {
        Program::new(ProgramKind::PowerDown, false)
    };

    let mode_flag = if req.blinking {
        program.write(reg::RSTR, reg::RSTR_BREATHE);
        reg::LCFG_BREATHE
    } else {
        0
    };

    match program.kind {
        ProgramKind::Light { bring_up } => {
            if bring_up {
                encode_bring_up(&mut program);
            }
            encode_light(&mut program, mode_flag);
        }
        ProgramKind::PowerDown => encode_power_down(&mut program),
        ProgramKind::Skip => {}
    }

    program
}

fn encode_bring_up(p: &mut Program) {
    let start = p.steps.len();
    p.write(reg::RSTR, reg::RSTR_RESET);
    p.write(reg::GCR, reg::GCR_ENABLE);
    p.delay_ms(reg::BRING_UP_SETTLE_MS);
    p.bring_up = Some(start..p.steps.len());
}

fn encode_light(p: &mut Program, mode_flag: u8) {
    p.write(reg::GCR, reg::GCR_RUN);
    for addr in reg::LCFG {
        p.write(addr, mode_flag | reg::LCFG_BASE);
    }
    for (addr, max) in reg::PWM.into_iter().zip(reg::PWM_MAX) {
        p.write(addr, max);
    }
    for ch in 0..3 {
        p.write(reg::T0[ch], reg::T0_VALUE);
        p.write(reg::T1[ch], reg::T1_VALUE);
        p.write(reg::T2[ch], reg::T2_VALUE);
    }
    p.write(reg::LCTR, reg::LCTR_ALL);
    p.delay_ms(reg::ENABLE_SETTLE_MS);
}

fn encode_power_down(p: &mut Program) {
    p.write(reg::GCR, reg::GCR_OFF);
    p.delay_ms(reg::POWER_DOWN_SETTLE_MS);
    p.write(reg::LCTR, reg::LCTR_OFF);
    for addr in reg::PWM {
        p.write(addr, reg::PWM_OFF);
    }
    p.delay_ms(reg::POWER_DOWN_SETTLE_MS);
}
