//! Deferred write engine: a bounded FIFO queue drained by one worker thread.
//!
//! Level changes arrive from callers that must not block, while every
//! register access blocks. Jobs are pushed with a non-blocking `try_send`
//! and executed strictly in order on the worker, which also makes GPIO
//! read-modify-write safe: no other job can touch the output byte between
//! the read and the write.

use crate::consts::MAX_CHANNELS;
use crate::error::{Error, Result};
use crate::snapshot::WriteTask;
use log::{debug, error, trace, warn};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Operations the worker needs from the chip.
pub(crate) trait JobTarget {
    fn read_register(&mut self, register: u8) -> Result<u8>;
    fn write_register(&mut self, register: u8, value: u8) -> Result<()>;
    /// Power on, settle and pulse reset the way resume needs.
    fn power_up(&mut self) -> Result<()>;
    fn power_down(&mut self) -> Result<()>;
}

/// Channel that issued a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Origin {
    pub channel: usize,
}

/// Single unit of deferred work.
#[derive(Debug)]
pub(crate) enum Job {
    /// Plain register write.
    Write {
        task: WriteTask,
        origin: Option<Origin>,
    },
    /// Read `register`, set or clear `mask`, write the full byte back.
    UpdateBit {
        register: u8,
        mask: u8,
        high: bool,
        origin: Origin,
    },
    PowerUp,
    PowerDown,
    /// Acknowledged once every job queued before it has run.
    Flush(SyncSender<()>),
    /// Sentinel queued at removal; everything before it still runs.
    Shutdown,
}

impl Job {
    fn origin(&self) -> Option<Origin> {
        match self {
            Job::Write { origin, .. } => *origin,
            Job::UpdateBit { origin, .. } => Some(*origin),
            _ => None,
        }
    }
}

/// Per-channel count of jobs the worker has finished (run or dropped).
///
/// Written only by the worker; the channel controller compares it against
/// its own count of accepted jobs.
#[derive(Debug)]
pub(crate) struct AppliedMarks([AtomicU32; MAX_CHANNELS]);

impl AppliedMarks {
    pub(crate) fn new() -> Self {
        AppliedMarks(std::array::from_fn(|_| AtomicU32::new(0)))
    }

    pub(crate) fn get(&self, channel: usize) -> u32 {
        self.0
            .get(channel)
            .map_or(0, |mark| mark.load(Ordering::Acquire))
    }

    pub(crate) fn complete(&self, origin: Origin) {
        if let Some(mark) = self.0.get(origin.channel) {
            mark.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Handle to a running worker. Dropping it does not stop the worker; call
/// [`WriteEngine::shutdown`].
#[derive(Debug)]
pub(crate) struct WriteEngine {
    tx: SyncSender<Job>,
    closed: AtomicBool,
    applied: Arc<AppliedMarks>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WriteEngine {
    /// Spawns the worker thread, moving `target` onto it.
    pub(crate) fn start<T>(target: T, name: String, depth: usize) -> Result<Self>
    where
        T: JobTarget + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(depth);
        let applied = Arc::new(AppliedMarks::new());
        let marks = Arc::clone(&applied);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run(target, rx, &marks))?;
        debug!("Started write worker '{}' (queue depth {})", name, depth);
        Ok(WriteEngine {
            tx,
            closed: AtomicBool::new(false),
            applied,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Queues a job without blocking. Never touches the bus.
    pub(crate) fn try_enqueue(&self, job: Job) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::DeviceRemoved);
        }
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                warn!("Write queue full, rejecting {:?}", job);
                Err(Error::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::DeviceRemoved),
        }
    }

    /// Queues a job, waiting for room if the queue is full.
    pub(crate) fn enqueue(&self, job: Job) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::DeviceRemoved);
        }
        self.tx.send(job).map_err(|_| Error::DeviceRemoved)
    }

    /// Blocks until every job queued so far has run.
    pub(crate) fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        self.enqueue(Job::Flush(ack_tx))?;
        ack_rx.recv().map_err(|_| Error::DeviceRemoved)
    }

    /// Queues every task of `writes` in order.
    pub(crate) fn enqueue_writes(&self, writes: impl IntoIterator<Item = WriteTask>) -> Result<()> {
        for task in writes {
            self.enqueue(Job::Write { task, origin: None })?;
        }
        Ok(())
    }

    pub(crate) fn applied(&self) -> &AppliedMarks {
        &self.applied
    }

    /// Stops accepting jobs, lets the queued ones drain and joins the worker.
    /// Safe to call more than once.
    pub(crate) fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // The worker may already be gone if it panicked; nothing to wake then.
        let _ = self.tx.send(Job::Shutdown);
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Write worker panicked");
            }
        }
        debug!("Write worker stopped");
    }
}

fn run<T: JobTarget>(mut target: T, rx: Receiver<Job>, marks: &AppliedMarks) {
    while let Ok(job) = rx.recv() {
        if matches!(job, Job::Shutdown) {
            let dropped = discard_backlog(&rx);
            if dropped > 0 {
                warn!("Discarded {} jobs queued after shutdown", dropped);
            }
            break;
        }
        let origin = job.origin();
        if let Err(e) = execute(&mut target, &job) {
            // The caller returned long ago; log and move on.
            error!("Dropping {:?}: {}", job, e);
        }
        if let Some(origin) = origin {
            marks.complete(origin);
        }
    }
}

fn discard_backlog(rx: &Receiver<Job>) -> usize {
    let mut dropped = 0;
    loop {
        match rx.try_recv() {
            Ok(_) => dropped += 1,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return dropped,
        }
    }
}

fn execute<T: JobTarget>(target: &mut T, job: &Job) -> Result<()> {
    match *job {
        Job::Write { task, .. } => target.write_register(task.register, task.value),
        Job::UpdateBit {
            register,
            mask,
            high,
            ..
        } => {
            let current = target.read_register(register)?;
            let value = if high {
                current | mask
            } else {
                current & !mask
            };
            trace!(
                "Output reg 0x{:02X}: 0x{:02X} -> 0x{:02X}",
                register,
                current,
                value
            );
            target.write_register(register, value)
        }
        Job::PowerUp => target.power_up(),
        Job::PowerDown => target.power_down(),
        Job::Flush(ref ack) => {
            // Nobody waiting any more is fine.
            let _ = ack.send(());
            Ok(())
        }
        Job::Shutdown => Ok(()),
    }
}
