//! Per-channel runtime state and translation of level changes into jobs.

use crate::config::ChannelConfig;
use crate::error::{Error, Result};
use crate::pin::{PinDescriptor, PinMode, RegisterTarget};
use crate::snapshot::WriteTask;
use crate::worker::{AppliedMarks, Job, Origin};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Runtime state of one configured pin.
///
/// Updated lock-free so [`Aw9523b::set_level`](crate::Aw9523b::set_level)
/// can run from contexts that must not block.
#[derive(Debug)]
pub(crate) struct Channel {
    index: usize,
    name: String,
    default_trigger: Option<String>,
    descriptor: PinDescriptor,
    target: RegisterTarget,
    level: AtomicU8,
    queued: AtomicU32,
}

impl Channel {
    /// Resolves the channel's register. Unmapped pins are rejected here,
    /// at configuration time.
    pub(crate) fn new(index: usize, config: &ChannelConfig) -> Result<Self> {
        let desc = config.descriptor;
        let target = desc.target().ok_or(Error::UnmappedPin {
            channel: index,
            port: desc.port,
            bit: desc.bit,
            mode: desc.mode,
        })?;
        let name = match &config.name {
            Some(name) => format!("AW.{}", name),
            None => format!("AW.{}", index),
        };
        Ok(Channel {
            index,
            name,
            default_trigger: config.default_trigger.clone(),
            descriptor: desc,
            target,
            level: AtomicU8::new(desc.default_value),
            queued: AtomicU32::new(0),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn default_trigger(&self) -> Option<&str> {
        self.default_trigger.as_deref()
    }

    pub(crate) fn descriptor(&self) -> &PinDescriptor {
        &self.descriptor
    }

    pub(crate) fn level(&self) -> u8 {
        self.level.load(Ordering::Acquire)
    }

    /// True while at least one job accepted for this channel has not run yet.
    pub(crate) fn is_pending(&self, applied: &AppliedMarks) -> bool {
        let done = applied.get(self.index);
        let queued = self.queued.load(Ordering::Acquire);
        // The worker can finish a job before its submitter counts it.
        (queued.wrapping_sub(done) as i32) > 0
    }

    /// Builds the job that applies `level` and hands it to `submit`.
    ///
    /// The level is recorded only once the queue has accepted the job, so a
    /// refused call leaves the channel untouched.
    pub(crate) fn apply(&self, level: u8, submit: impl FnOnce(Job) -> Result<()>) -> Result<()> {
        let origin = Origin {
            channel: self.index,
        };
        let job = match (self.descriptor.mode, self.target) {
            (PinMode::Gpio, RegisterTarget::OutputBit { register, mask }) => Job::UpdateBit {
                register,
                mask,
                high: level != 0,
                origin,
            },
            (_, target) => Job::Write {
                task: WriteTask::new(target.register(), level),
                origin: Some(origin),
            },
        };
        submit(job)?;
        self.queued.fetch_add(1, Ordering::AcqRel);
        self.level.store(level, Ordering::Release);
        Ok(())
    }
}
