//! Driver service — attach, detach and the per-channel API.
//!
//! [`LedDevice`] is the ownership handle returned by attach and consumed
//! by detach. It owns two locks, the programming worker and the host
//! framework registrations:
//!
//! ```text
//!  ChannelHandle ──lock (short)──▶ ┌───────────────────────────┐
//!   set_brightness                 │ RequestState              │
//!   set_blink                      │ store · active · detached │
//!   blink_store                    └─────────────▲─────────────┘
//!        │                                       │ snapshot
//!        └──submit──▶ JobQueue ──▶ aw2013-prog worker
//!                                                │ lock for the whole program
//!                                  ┌─────────────▼─────────────┐
//!                                  │ DeviceCore                │
//!                                  │ controller · sink         │
//!                                  └───────────────────────────┘
//! ```
//!
//! Setters only ever take the request lock, which is never held across
//! bus I/O, so they do not wait for a program in flight. The device lock
//! is held for a whole program including its settling delays.
//!
//! Attach is strict: any failure unwinds every registration, switches
//! the supply back off and is returned. Programming is best-effort and
//! silent to the setters; failures only surface as log records and
//! [`DriverEvent::ProgramFailed`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use heapless::Vec as FixedVec;
use log::{debug, error, info, warn};

use crate::channels::{ChannelState, ChannelStore, Color};
use crate::config::{ChannelDescriptor, DeviceConfig, MAX_CHANNELS};
use crate::device::{DeviceController, PowerState};
use crate::error::{Error, Result};
use crate::protocol::{OutputRequest, ProgramKind, encode};
use crate::serializer::{JobSender, ProgrammingSerializer};

use super::events::DriverEvent;
use super::ports::{EventSink, LedClassPort, PowerSupply, RegisterBus};

// ───────────────────────────────────────────────────────────────
// Request state (short-held lock shared with channel handles)
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct RequestState {
    store: ChannelStore,
    /// Most recently requested color; `None` until the first request
    /// and again after detach.
    active: Option<Color>,
    /// Set at teardown; later requests are dropped.
    detached: bool,
}

impl RequestState {
    /// The latest request and its channel state.
    fn snapshot(&self) -> Option<(Color, ChannelState)> {
        self.active.map(|color| (color, self.store.get(color)))
    }
}

type SharedRequests = Arc<Mutex<RequestState>>;

/// Lock a mutex, recovering the data if a holder panicked. The next
/// program overwrites whatever a panicking job left half done.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ───────────────────────────────────────────────────────────────
// Device core (bus owner, locked for a whole program)
// ───────────────────────────────────────────────────────────────

struct DeviceCore<B, P, D, E> {
    controller: DeviceController<B, P, D>,
    sink: E,
}

impl<B, P, D, E> DeviceCore<B, P, D, E>
where
    B: RegisterBus,
    P: PowerSupply,
    D: DelayNs,
    E: EventSink,
{
    fn run_job(&mut self, requested: Color, color: Color, state: &ChannelState) {
        if color != requested {
            debug!("job queued by {} programs latest request {}", requested, color);
        }
        debug!(
            "color = {}, brightness = {}, blink = {}",
            color, state.brightness, state.blinking
        );

        let was_active = self.controller.session_active();
        let program = encode(&OutputRequest::for_channel(color, state), was_active);
        if program.kind() == ProgramKind::Skip {
            debug!("{} has no output path, nothing to program", color);
            return;
        }

        let report = self.controller.execute(&program);
        let now_active = self.controller.session_active();
        if !was_active && now_active {
            self.sink.emit(&DriverEvent::SessionStarted);
        } else if was_active && !now_active {
            self.sink.emit(&DriverEvent::SessionEnded);
        }
        if !report.is_clean() {
            warn!(
                "{}: {}/{} register writes failed",
                color, report.failures, report.writes
            );
            self.sink.emit(&DriverEvent::ProgramFailed {
                color,
                writes: report.writes,
                failures: report.failures,
            });
        }
    }
}

// ───────────────────────────────────────────────────────────────
// LedDevice
// ───────────────────────────────────────────────────────────────

/// An attached chip.
///
/// Dropping it without [`detach`](Self::detach) runs the same teardown.
pub struct LedDevice<B, P, D, R, E>
where
    B: RegisterBus + Send + 'static,
    P: PowerSupply + Send + 'static,
    D: DelayNs + Send + 'static,
    R: LedClassPort,
    E: EventSink + Send + 'static,
{
    core: Arc<Mutex<DeviceCore<B, P, D, E>>>,
    requests: SharedRequests,
    serializer: ProgrammingSerializer,
    registrar: R,
    channels: FixedVec<(Color, ChannelDescriptor), MAX_CHANNELS>,
    torn_down: bool,
}

impl<B, P, D, R, E> LedDevice<B, P, D, R, E>
where
    B: RegisterBus + Send + 'static,
    P: PowerSupply + Send + 'static,
    D: DelayNs + Send + 'static,
    R: LedClassPort,
    E: EventSink + Send + 'static,
{
    /// Bring the chip up and register its channels.
    ///
    /// Order: validate config → supply on (+ settle) → liveness probe →
    /// register channels → start worker.
    pub fn attach(
        config: &DeviceConfig,
        bus: B,
        supply: P,
        delay: D,
        mut registrar: R,
        mut sink: E,
    ) -> Result<Self> {
        let colors = match config.validate() {
            Ok(colors) => colors,
            Err(e) => {
                error!("attach: {}", e);
                sink.emit(&DriverEvent::AttachFailed(e));
                return Err(e);
            }
        };

        let mut controller = DeviceController::new(bus, supply, delay, config.driver.clone());

        if let Err(e) = controller.power_up() {
            error!("attach: regulator failed: {}", e);
            sink.emit(&DriverEvent::AttachFailed(e));
            return Err(e);
        }

        let started = controller
            .probe()
            .and_then(|()| register_all(&mut registrar, &colors, &config.channels));
        let channels = match started {
            Ok(channels) => channels,
            Err(e) => {
                error!("attach: {}", e);
                shut_supply(&mut controller);
                sink.emit(&DriverEvent::AttachFailed(e));
                return Err(e);
            }
        };

        let core = Arc::new(Mutex::new(DeviceCore { controller, sink }));
        let requests = SharedRequests::default();

        let worker_core = Arc::clone(&core);
        let worker_requests = Arc::clone(&requests);
        let serializer = match ProgrammingSerializer::spawn(move |requested| {
            let Some((color, state)) = lock(&worker_requests).snapshot() else {
                return;
            };
            lock(&worker_core).run_job(requested, color, &state);
        }) {
            Ok(s) => s,
            Err(e) => {
                unregister_all(&mut registrar, &channels);
                let mut c = lock(&core);
                shut_supply(&mut c.controller);
                c.sink.emit(&DriverEvent::AttachFailed(e));
                return Err(e);
            }
        };

        lock(&core).sink.emit(&DriverEvent::Attached {
            channels: channels.len(),
        });
        info!("attached with {} channel(s)", channels.len());

        Ok(Self {
            core,
            requests,
            serializer,
            registrar,
            channels,
            torn_down: false,
        })
    }

    /// Handle for one registered channel.
    pub fn channel(&self, color: Color) -> Option<ChannelHandle> {
        self.channels
            .iter()
            .any(|(c, _)| *c == color)
            .then(|| ChannelHandle {
                color,
                requests: Arc::clone(&self.requests),
                jobs: self.serializer.sender(),
            })
    }

    /// Handle for the channel registered under `name`.
    pub fn channel_by_name(&self, name: &str) -> Option<ChannelHandle> {
        self.channels
            .iter()
            .find(|(_, d)| d.name == name)
            .and_then(|(c, _)| self.channel(*c))
    }

    /// Registered channels, in registration order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelDescriptor> {
        self.channels.iter().map(|(_, d)| d)
    }

    /// Block until every queued programming job has run.
    pub fn flush(&self) {
        self.serializer.sender().flush();
    }

    pub fn session_active(&self) -> bool {
        lock(&self.core).controller.session_active()
    }

    pub fn power_state(&self) -> PowerState {
        lock(&self.core).controller.power_state()
    }

    /// Tear the device down: finish queued jobs, unregister every
    /// channel in reverse order, turn the outputs off and cut the supply.
    pub fn detach(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;

        lock(&self.requests).detached = true;
        self.serializer.shutdown();
        unregister_all(&mut self.registrar, &self.channels);
        lock(&self.requests).active = None;

        let mut core = lock(&self.core);
        if core.controller.session_active() {
            let off = encode(
                &OutputRequest::for_channel(Color::Red, &ChannelState::default()),
                true,
            );
            core.controller.execute(&off);
            core.sink.emit(&DriverEvent::SessionEnded);
        }
        let result = core.controller.power_down();
        if let Err(e) = result {
            error!("detach: {}", e);
        }
        core.sink.emit(&DriverEvent::Detached);
        info!("removed");
        result
    }
}

impl<B, P, D, R, E> Drop for LedDevice<B, P, D, R, E>
where
    B: RegisterBus + Send + 'static,
    P: PowerSupply + Send + 'static,
    D: DelayNs + Send + 'static,
    R: LedClassPort,
    E: EventSink + Send + 'static,
{
    fn drop(&mut self) {
        if !self.torn_down {
            warn!("device dropped while attached, tearing down");
            // Errors are already logged by teardown.
            let _ = self.teardown();
        }
    }
}

fn register_all<R: LedClassPort>(
    registrar: &mut R,
    colors: &[Color],
    descriptors: &[ChannelDescriptor],
) -> Result<FixedVec<(Color, ChannelDescriptor), MAX_CHANNELS>> {
    let mut done = FixedVec::new();
    for (&color, desc) in colors.iter().zip(descriptors) {
        if let Err(e) = registrar.register(desc) {
            error!("failed to register {}: {}", desc.name, e);
            unregister_all(registrar, &done);
            return Err(e);
        }
        if done.push((color, desc.clone())).is_err() {
            registrar.unregister(desc);
            unregister_all(registrar, &done);
            return Err(Error::AllocationFailure("channel table"));
        }
        debug!("registered {}", desc.name);
    }
    Ok(done)
}

fn unregister_all<R: LedClassPort>(registrar: &mut R, channels: &[(Color, ChannelDescriptor)]) {
    for (_, desc) in channels.iter().rev() {
        registrar.unregister(desc);
    }
}

fn shut_supply<B, P, D>(controller: &mut DeviceController<B, P, D>)
where
    B: RegisterBus,
    P: PowerSupply,
    D: DelayNs,
{
    if let Err(e) = controller.power_down() {
        warn!("supply left on: {}", e);
    }
}

// ───────────────────────────────────────────────────────────────
// ChannelHandle
// ───────────────────────────────────────────────────────────────

/// What the host framework holds for one color channel.
///
/// Setters update the channel store under the request lock, record the
/// color as the latest request and enqueue a programming job. They never
/// wait for the bus. After detach they are logged no-ops.
#[derive(Clone)]
pub struct ChannelHandle {
    color: Color,
    requests: SharedRequests,
    jobs: JobSender,
}

impl ChannelHandle {
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_brightness(&self, value: u8) {
        self.update(|store, color| store.set_brightness(color, value));
    }

    /// Start a full-brightness blink. The timing is recorded but the
    /// chip runs its fixed breathing pattern.
    pub fn set_blink(&self, on_ms: u32, off_ms: u32) {
        self.update(|store, color| store.set_blink(color, on_ms, off_ms));
    }

    /// Read side of the `blink` attribute: the channel brightness.
    pub fn blink_show(&self) -> String {
        format!("{}\n", self.brightness())
    }

    /// Write side of the `blink` attribute. Any non-zero decimal turns a
    /// full-brightness blink on, zero turns the channel off. Returns the
    /// number of bytes consumed.
    pub fn blink_store(&self, input: &str) -> Result<usize> {
        let value: u64 = input
            .trim()
            .parse()
            .map_err(|_| Error::InvalidArgument("blink expects an unsigned decimal"))?;
        let enabled = value != 0;
        self.update(|store, color| store.set_blink_enabled(color, enabled));
        Ok(input.len())
    }

    pub fn state(&self) -> ChannelState {
        lock(&self.requests).store.get(self.color)
    }

    pub fn brightness(&self) -> u8 {
        self.state().brightness
    }

    pub fn is_blinking(&self) -> bool {
        self.state().blinking
    }

    fn update(&self, apply: impl FnOnce(&mut ChannelStore, Color)) {
        {
            let mut req = lock(&self.requests);
            if req.detached {
                warn!("{}: device detached, request ignored", self.color);
                return;
            }
            apply(&mut req.store, self.color);
            req.active = Some(self.color);
        }
        self.jobs.submit(self.color);
    }
}
