//! Programming Serializer — single-worker job queue.
//!
//! Uses a bounded `embassy-sync` channel to bridge the non-blocking
//! channel setters with one dedicated worker thread. The worker drains
//! jobs strictly in FIFO order and runs one at a time, so register
//! programs from different channels can never interleave on the bus.
//!
//! ```text
//! ┌────────────────┐  Job::Program  ┌──────────────────────┐
//! │ ChannelHandle  │───try_send────▶│  aw2013-prog thread  │──▶ snapshot ─▶ lock device ─▶ encode ─▶ bus
//! │ (any thread)   │                │  block_on(receive)   │
//! └────────────────┘                └──────────────────────┘
//! ```
//!
//! A job does not carry the state to program. The worker reads the
//! latest requested color from the request state when the job runs, so a
//! burst of requests may program the newest color more than once and
//! a request dropped on a full queue is still honoured by the job
//! already waiting ahead of it.
//!
//! If the worker dies (a panicking adapter), `flush` and `shutdown` notice
//! through a liveness flag instead of waiting on a queue nobody drains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use futures_lite::future::block_on;
use log::{debug, error, info, warn};

use crate::channels::Color;
use crate::error::{Error, Result};

/// Queue depth for pending programming jobs.
pub const QUEUE_DEPTH: usize = 8;

const WORKER_NAME: &str = "aw2013-prog";
const WORKER_STACK: usize = 16 * 1024;
/// How often a blocked producer re-checks that the worker is still alive.
const LIVENESS_POLL: Duration = Duration::from_millis(5);

/// One unit of work for the worker.
pub enum Job {
    /// Program the most recently requested color. `requested` is the
    /// color whose request enqueued this job.
    Program { requested: Color },
    /// Acknowledge once every job queued ahead of this one has run.
    Barrier(mpsc::SyncSender<()>),
    /// Stop the worker after the jobs queued ahead of this one.
    Shutdown,
}

pub type JobQueue = Channel<CriticalSectionRawMutex, Job, QUEUE_DEPTH>;

/// Producer side of the queue; cheap to clone into every channel handle.
#[derive(Clone)]
pub struct JobSender {
    queue: Arc<JobQueue>,
    alive: Arc<AtomicBool>,
}

impl JobSender {
    /// Enqueue a programming job without blocking. Returns `false` when
    /// the queue is full; a job already queued will pick up the request.
    pub fn submit(&self, requested: Color) -> bool {
        match self.queue.try_send(Job::Program { requested }) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("job queue full, {} coalesced into pending job", requested);
                false
            }
        }
    }

    /// Block until every job submitted before this call has run. Returns
    /// early if the worker has stopped.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        if !self.send_while_alive(Job::Barrier(ack_tx)) {
            return;
        }
        loop {
            match ack_rx.recv_timeout(LIVENESS_POLL) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) if !self.worker_alive() => {
                    warn!("{} is gone, flush abandoned", WORKER_NAME);
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether the worker thread is still draining the queue.
    pub fn worker_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Wait for queue space, giving up if the worker stops.
    fn send_while_alive(&self, mut job: Job) -> bool {
        loop {
            if !self.worker_alive() {
                return false;
            }
            match self.queue.try_send(job) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    job = back;
                    std::thread::sleep(LIVENESS_POLL);
                }
            }
        }
    }
}

/// Clears the liveness flag when the worker exits, panics included.
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the worker thread.
pub struct ProgrammingSerializer {
    sender: JobSender,
    worker: Option<JoinHandle<()>>,
}

impl ProgrammingSerializer {
    /// Start the worker. `run` is invoked once per programming job, on
    /// the worker thread, with the color that enqueued it.
    pub fn spawn<F>(run: F) -> Result<Self>
    where
        F: FnMut(Color) + Send + 'static,
    {
        let queue = Arc::new(JobQueue::new());
        let alive = Arc::new(AtomicBool::new(true));
        let worker_queue = Arc::clone(&queue);
        let guard = AliveGuard(Arc::clone(&alive));

        let worker = std::thread::Builder::new()
            .name(WORKER_NAME.into())
            .stack_size(WORKER_STACK)
            .spawn(move || {
                let _guard = guard;
                worker_loop(&worker_queue, run);
            })
            .map_err(|e| {
                error!("cannot start {}: {}", WORKER_NAME, e);
                Error::AllocationFailure("programming worker thread")
            })?;

        info!("{} started (queue depth {})", WORKER_NAME, QUEUE_DEPTH);
        Ok(Self {
            sender: JobSender { queue, alive },
            worker: Some(worker),
        })
    }

    pub fn sender(&self) -> JobSender {
        self.sender.clone()
    }

    /// Let queued jobs finish, then stop and join the worker.
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.sender.send_while_alive(Job::Shutdown);
        if worker.join().is_err() {
            error!("{} panicked", WORKER_NAME);
        } else {
            info!("{} stopped", WORKER_NAME);
        }
    }
}

impl Drop for ProgrammingSerializer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<F: FnMut(Color)>(queue: &JobQueue, mut run: F) {
    loop {
        match block_on(queue.receive()) {
            Job::Program { requested } => run(requested),
            Job::Barrier(ack) => {
                let _ = ack.send(());
            }
            Job::Shutdown => break,
        }
    }
}
