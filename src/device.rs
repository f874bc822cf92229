//! Device Lifecycle Controller.
//!
//! Owns the bus, the supply and the delay source, and tracks two
//! independent pieces of lifecycle state:
//!
//! ```text
//!  supply:   POWERED_DOWN ──power_up()──▶ POWERED_UP ──power_down()──▶ POWERED_DOWN
//!
//!  session:  closed ──light program──▶ open ──power-down program──▶ closed
//!            (may cycle many times within one POWERED_UP period)
//! ```
//!
//! Programs are executed best-effort: a failed register write is logged
//! and counted, and the remaining steps still run.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{PowerSupply, RegisterBus};
use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::protocol::registers as reg;
use crate::protocol::{Program, ProgramKind, Step};

/// Supply state of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    PoweredDown,
    PoweredUp,
}

/// Outcome of one [`DeviceController::execute`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Register writes attempted.
    pub writes: usize,
    /// Register writes the bus rejected.
    pub failures: usize,
}

impl ExecutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

pub struct DeviceController<B, P, D> {
    bus: B,
    supply: P,
    delay: D,
    config: DriverConfig,
    power: PowerState,
    session_active: bool,
}

impl<B, P, D> DeviceController<B, P, D>
where
    B: RegisterBus,
    P: PowerSupply,
    D: DelayNs,
{
    pub fn new(bus: B, supply: P, delay: D, config: DriverConfig) -> Self {
        Self {
            bus,
            supply,
            delay,
            config,
            power: PowerState::PoweredDown,
            session_active: false,
        }
    }

    // ── Supply ────────────────────────────────────────────────

    /// Switch the supply on and wait for it to settle.
    pub fn power_up(&mut self) -> Result<()> {
        if self.power == PowerState::PoweredUp {
            return Ok(());
        }
        self.supply.enable(true).map_err(Error::from)?;
        self.delay.delay_ms(self.config.power_settle_ms);
        self.power = PowerState::PoweredUp;
        info!("supply on ({} ms settle)", self.config.power_settle_ms);
        Ok(())
    }

    /// Switch the supply off. The chip loses all register state, so the
    /// session is closed as well.
    pub fn power_down(&mut self) -> Result<()> {
        if self.power == PowerState::PoweredDown {
            return Ok(());
        }
        self.supply.enable(false).map_err(Error::from)?;
        self.power = PowerState::PoweredDown;
        self.session_active = false;
        info!("supply off");
        Ok(())
    }

    pub fn power_state(&self) -> PowerState {
        self.power
    }

    // ── Liveness ──────────────────────────────────────────────

    /// Probe the chip with a reset write, waiting `probe_interval_ms`
    /// before each of up to `probe_attempts` attempts.
    pub fn probe(&mut self) -> Result<()> {
        let attempts = self.config.probe_attempts;
        for attempt in 1..=attempts {
            self.delay.delay_ms(self.config.probe_interval_ms);
            match self.bus.write_register(reg::RSTR, reg::RSTR_RESET) {
                Ok(()) => {
                    debug!("probe answered on attempt {}/{}", attempt, attempts);
                    return Ok(());
                }
                Err(e) => debug!("probe attempt {}/{} failed: {}", attempt, attempts, e),
            }
        }
        Err(Error::ProbeFailure { attempts })
    }

    // ── Programming ───────────────────────────────────────────

    /// Whether the chip has been brought up since the last power-down
    /// program.
    pub fn session_active(&self) -> bool {
        self.session_active
    }

    /// Run every step of `program`, continuing past failed writes.
    ///
    /// A power-down program always closes the session. A light program
    /// with a bring-up opens it once every bring-up write went through;
    /// failures later in the light body do not force another reset.
    pub fn execute(&mut self, program: &Program) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let bring_up = program.bring_up_steps().unwrap_or(0..0);
        let mut bring_up_failures = 0;

        for (index, step) in program.steps().iter().enumerate() {
            match *step {
                Step::Write { reg, value } => {
                    report.writes += 1;
                    if let Err(e) = self.bus.write_register(reg, value) {
                        report.failures += 1;
                        if bring_up.contains(&index) {
                            bring_up_failures += 1;
                        }
                        warn!("write 0x{:02x} <- 0x{:02x} failed: {}", reg, value, e);
                    }
                }
                Step::DelayMs(ms) => self.delay.delay_ms(ms),
            }
        }

        match program.kind() {
            ProgramKind::Light { bring_up: true } => {
                self.session_active = bring_up_failures == 0;
            }
            ProgramKind::Light { bring_up: false } | ProgramKind::Skip => {}
            ProgramKind::PowerDown => self.session_active = false,
        }

        report
    }
}
