//! Mock hardware for integration tests.
//!
//! The bus, the supply and the delay source all append to one shared
//! operation log, so tests can assert on the exact order of register
//! writes, settling delays and supply switching.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use aw2013::app::events::DriverEvent;
use aw2013::app::ports::{EventSink, LedClassPort, PowerSupply, RegisterBus};
use aw2013::error::{BusError, Error, PowerError};
use aw2013::protocol::{Program, Step};
use aw2013::{ChannelDescriptor, DeviceConfig, LedDevice};
use embedded_hal::delay::DelayNs;

// ── Operation record ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Write { reg: u8, value: u8 },
    DelayMs(u32),
    Supply(bool),
}

impl From<Step> for BusOp {
    fn from(step: Step) -> Self {
        match step {
            Step::Write { reg, value } => BusOp::Write { reg, value },
            Step::DelayMs(ms) => BusOp::DelayMs(ms),
        }
    }
}

/// The bus operations a program is expected to produce.
pub fn ops_of(program: &Program) -> Vec<BusOp> {
    program.steps().iter().map(|s| BusOp::from(*s)).collect()
}

// ── Gate: parks the worker inside a settle delay ─────────────

#[derive(Default)]
struct GateState {
    closed: bool,
    parked: bool,
}

#[derive(Default)]
struct Gate {
    state: Mutex<GateState>,
    cv: Condvar,
}

impl Gate {
    fn pass(&self) {
        let mut s = self.state.lock().unwrap();
        while s.closed {
            s.parked = true;
            self.cv.notify_all();
            s = self.cv.wait(s).unwrap();
        }
        s.parked = false;
    }
}

// ── Rig: shared state behind every mock ──────────────────────

#[derive(Clone, Default)]
pub struct Rig {
    log: Arc<Mutex<Vec<BusOp>>>,
    nack_skip: Arc<AtomicUsize>,
    nack_remaining: Arc<AtomicUsize>,
    supply_refuses: Arc<AtomicBool>,
    gate: Arc<Gate>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> MockBus {
        MockBus { rig: self.clone() }
    }

    pub fn supply(&self) -> MockSupply {
        MockSupply { rig: self.clone() }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay { rig: self.clone() }
    }

    /// Reject the next `n` register writes.
    pub fn nack_next(&self, n: usize) {
        self.nack_skip.store(0, Ordering::SeqCst);
        self.nack_remaining.store(n, Ordering::SeqCst);
    }

    /// Reject only the write `index` writes from now (zero-based).
    pub fn nack_write(&self, index: usize) {
        self.nack_skip.store(index, Ordering::SeqCst);
        self.nack_remaining.store(1, Ordering::SeqCst);
    }

    /// Park the next delay (and every one after it) until [`open_gate`].
    ///
    /// [`open_gate`]: Self::open_gate
    pub fn close_gate(&self) {
        self.gate.state.lock().unwrap().closed = true;
    }

    pub fn open_gate(&self) {
        self.gate.state.lock().unwrap().closed = false;
        self.gate.cv.notify_all();
    }

    /// Wait until a delay is parked at the closed gate.
    pub fn wait_parked(&self) {
        let s = self.gate.state.lock().unwrap();
        let (s, timeout) = self
            .gate
            .cv
            .wait_timeout_while(s, Duration::from_secs(5), |s| !s.parked)
            .unwrap();
        assert!(s.parked && !timeout.timed_out(), "worker never reached the gate");
    }

    pub fn refuse_supply(&self) {
        self.supply_refuses.store(true, Ordering::SeqCst);
    }

    pub fn ops(&self) -> Vec<BusOp> {
        self.log.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                BusOp::Write { reg, value } => Some((reg, value)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    fn push(&self, op: BusOp) {
        self.log.lock().unwrap().push(op);
    }
}

// ── MockBus ───────────────────────────────────────────────────

pub struct MockBus {
    rig: Rig,
}

impl RegisterBus for MockBus {
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        let armed = self.rig.nack_remaining.load(Ordering::SeqCst) > 0;
        let skipped = armed
            && self
                .rig
                .nack_skip
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        let nacked = !skipped
            && self
                .rig
                .nack_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if nacked {
            return Err(BusError::NoAcknowledge);
        }
        self.rig.push(BusOp::Write { reg, value });
        Ok(())
    }
}

// ── MockSupply ────────────────────────────────────────────────

pub struct MockSupply {
    rig: Rig,
}

impl PowerSupply for MockSupply {
    fn enable(&mut self, on: bool) -> Result<(), PowerError> {
        if on && self.rig.supply_refuses.load(Ordering::SeqCst) {
            return Err(PowerError::EnableFailed);
        }
        self.rig.push(BusOp::Supply(on));
        Ok(())
    }
}

// ── MockDelay ─────────────────────────────────────────────────

pub struct MockDelay {
    rig: Rig,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.rig.push(BusOp::DelayMs(ms));
        self.rig.gate.pass();
    }
}

// ── MockRegistrar ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegCall {
    Register(String),
    Unregister(String),
}

#[derive(Clone, Default)]
pub struct MockRegistrar {
    pub calls: Arc<Mutex<Vec<RegCall>>>,
    /// Zero-based index of the `register` call that fails.
    fail_at: Option<usize>,
    registered: usize,
}

#[allow(dead_code)]
impl MockRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RegCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl LedClassPort for MockRegistrar {
    fn register(&mut self, channel: &ChannelDescriptor) -> Result<(), Error> {
        let index = self.registered;
        self.registered += 1;
        if self.fail_at == Some(index) {
            return Err(Error::AllocationFailure("led class device"));
        }
        self.calls
            .lock()
            .unwrap()
            .push(RegCall::Register(channel.name.clone()));
        Ok(())
    }

    fn unregister(&mut self, channel: &ChannelDescriptor) {
        self.calls
            .lock()
            .unwrap()
            .push(RegCall::Unregister(channel.name.clone()));
    }
}

// ── CollectingSink ────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct CollectingSink {
    pub events: Arc<Mutex<Vec<DriverEvent>>>,
}

#[allow(dead_code)]
impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DriverEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for CollectingSink {
    fn emit(&mut self, event: &DriverEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Helpers ───────────────────────────────────────────────────

pub type MockDevice = LedDevice<MockBus, MockSupply, MockDelay, MockRegistrar, CollectingSink>;

pub struct Harness {
    pub rig: Rig,
    pub registrar: MockRegistrar,
    pub sink: CollectingSink,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_registrar(MockRegistrar::new())
    }

    pub fn with_registrar(registrar: MockRegistrar) -> Self {
        Self {
            rig: Rig::new(),
            registrar,
            sink: CollectingSink::new(),
        }
    }

    pub fn attach(&self, config: &DeviceConfig) -> Result<MockDevice, Error> {
        LedDevice::attach(
            config,
            self.rig.bus(),
            self.rig.supply(),
            self.rig.delay(),
            self.registrar.clone(),
            self.sink.clone(),
        )
    }

    /// Attach the RGB layout and drop the attach-time operations from
    /// the log.
    pub fn attach_rgb(&self) -> MockDevice {
        let dev = self.attach(&DeviceConfig::rgb()).unwrap();
        self.rig.clear();
        dev
    }
}
