//! Device lifecycle: bring-up, suspend/resume restoration and removal.

use crate::bus::Hardware;
use crate::channel::Channel;
use crate::config::LedsConfig;
use crate::consts::{reg, CHIP_ID};
use crate::error::{Error, Result};
use crate::pin::PinDescriptor;
use crate::snapshot::{ConfigSnapshot, CurrentRange, OutputDrive};
use crate::worker::{Job, WriteEngine};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

/// Lifecycle state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceState {
    /// Created, chip not touched yet.
    Uninitialized,
    /// Bring-up in progress.
    Configuring,
    /// Accepting level changes.
    Active,
    /// Suspended; level changes are rejected until resume.
    Suspended,
    /// Chip absent or device torn down. Terminal.
    Removed,
}

impl DeviceState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => DeviceState::Uninitialized,
            1 => DeviceState::Configuring,
            2 => DeviceState::Active,
            3 => DeviceState::Suspended,
            _ => DeviceState::Removed,
        }
    }
}

/// Lock-free holder so the state can be read from non-blocking callers.
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: DeviceState) -> Self {
        StateCell(AtomicU8::new(state as u8))
    }

    fn get(&self) -> DeviceState {
        DeviceState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: DeviceState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Moves `from -> to`, or reports the state that prevented it.
    fn transition(
        &self,
        from: DeviceState,
        to: DeviceState,
        operation: &'static str,
    ) -> Result<()> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|actual| Error::InvalidState {
                state: DeviceState::from_u8(actual),
                operation,
            })
    }
}

/// Driver for one AW9523B used as a 16-channel LED / GPIO output expander.
///
/// Level changes ([`set_level`](Self::set_level)) never block: they update
/// the channel's state and queue a job for the device's write worker, which
/// owns the bus once [`bring_up`](Self::bring_up) has succeeded.
///
/// The type is `Sync` when the bus, lines and delay are `Send`, so it can be
/// shared through an `Arc` with whatever thread produces level changes.
pub struct Aw9523b<I2C, PWR, RST, D> {
    address: u8,
    output_drive: OutputDrive,
    current_range: CurrentRange,
    queue_depth: usize,
    has_power_line: bool,
    channels: Vec<Channel>,
    state: StateCell,
    snapshot: Option<ConfigSnapshot>,
    hardware: Mutex<Option<Hardware<I2C, PWR, RST, D>>>,
    engine: Option<WriteEngine>,
}

impl<I2C, PWR, RST, D> Aw9523b<I2C, PWR, RST, D>
where
    I2C: I2c + Send + 'static,
    PWR: OutputPin + Send + 'static,
    RST: OutputPin + Send + 'static,
    D: DelayNs + Send + 'static,
{
    /// Creates a driver in the [`Uninitialized`](DeviceState::Uninitialized)
    /// state. Validates the configuration but does not touch the chip.
    ///
    /// `power` and `reset` are optional; pass `None::<NoPin>` for a line
    /// that is not wired.
    ///
    /// # Errors
    ///
    /// [`Error::ChannelCount`], [`Error::ArgumentOutOfRange`] or
    /// [`Error::UnmappedPin`] for an invalid configuration.
    pub fn new(
        config: LedsConfig,
        i2c: I2C,
        power: Option<PWR>,
        reset: Option<RST>,
        delay: D,
    ) -> Result<Self> {
        config.validate()?;
        let channels = config
            .channels
            .iter()
            .enumerate()
            .map(|(index, channel)| Channel::new(index, channel))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "Configured AW9523B at 0x{:02X}: {} channels, power line: {}, reset line: {}",
            config.address,
            channels.len(),
            power.is_some(),
            reset.is_some()
        );
        for channel in &channels {
            trace!("{}: {:?}", channel.name(), channel.descriptor());
        }

        Ok(Self {
            address: config.address,
            output_drive: config.output_drive,
            current_range: config.current_range,
            queue_depth: config.queue_depth,
            has_power_line: power.is_some(),
            channels,
            state: StateCell::new(DeviceState::Uninitialized),
            snapshot: None,
            hardware: Mutex::new(Some(Hardware::new(
                i2c,
                config.address,
                power,
                reset,
                delay,
            ))),
            engine: None,
        })
    }

    /// Powers the chip, checks its identity and queues the full default
    /// configuration.
    ///
    /// Runs on the caller's thread up to and including the identity check.
    /// The configuration writes are only queued; they land asynchronously.
    ///
    /// # Errors
    ///
    /// [`Error::IdentityMismatch`] (or the bus error) if no AW9523B answers;
    /// the device is then [`Removed`](DeviceState::Removed) and nothing is
    /// queued. [`Error::InvalidState`] unless the device is uninitialized.
    pub fn bring_up(&mut self) -> Result<()> {
        self.state.transition(
            DeviceState::Uninitialized,
            DeviceState::Configuring,
            "bring up",
        )?;
        let result = self.configure();
        match &result {
            Ok(()) => {
                self.state.set(DeviceState::Active);
                debug!("AW9523B at 0x{:02X} active", self.address);
            }
            Err(e) => {
                warn!("Bring-up of AW9523B at 0x{:02X} failed: {}", self.address, e);
                self.state.set(DeviceState::Removed);
            }
        }
        result
    }

    fn configure(&mut self) -> Result<()> {
        let mut hw = self
            .hardware
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(Error::DeviceRemoved)?;

        hw.power_on()?;
        hw.reset_pulse()?;
        let id = hw.read(reg::IDENTITY)?;
        info!("AW9523B at 0x{:02X} read id: 0x{:02X}", hw.address(), id);
        if id != CHIP_ID {
            return Err(Error::IdentityMismatch {
                found: id,
                expected: CHIP_ID,
            });
        }

        let snapshot = ConfigSnapshot::from_descriptors(
            self.channels.iter().map(Channel::descriptor),
            self.output_drive,
            self.current_range,
        );
        let engine = WriteEngine::start(
            hw,
            format!("aw9523b-{:02x}", self.address),
            self.queue_depth,
        )?;
        let queued = engine.enqueue_writes(snapshot.register_writes());
        // Keep the engine even on failure so remove() can join the worker.
        self.engine = Some(engine);
        queued?;
        self.snapshot = Some(snapshot);
        Ok(())
    }
}

impl<I2C, PWR, RST, D> Aw9523b<I2C, PWR, RST, D> {
    /// Sets the level of a channel: brightness for LED channels, zero /
    /// non-zero for GPIO channels. Never blocks and never touches the bus.
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceRemoved`] after removal.
    /// - [`Error::InvalidChannelIndex`] if `index` is not a configured channel.
    /// - [`Error::InvalidState`] unless the device is active.
    /// - [`Error::QueueFull`] if the write queue has no room; the level is
    ///   not recorded.
    pub fn set_level(&self, index: usize, level: u8) -> Result<()> {
        let state = self.state.get();
        if state == DeviceState::Removed {
            return Err(Error::DeviceRemoved);
        }
        let channel = self.channels.get(index).ok_or(Error::InvalidChannelIndex {
            index,
            count: self.channels.len(),
        })?;
        if state != DeviceState::Active {
            warn!("Ignoring level {} for {}: device {:?}", level, channel.name(), state);
            return Err(Error::InvalidState {
                state,
                operation: "set level",
            });
        }
        let engine = self.engine.as_ref().ok_or(Error::DeviceRemoved)?;
        trace!("{} -> {}", channel.name(), level);
        channel.apply(level, |job| engine.try_enqueue(job))
    }

    /// Prepares the chip for system suspend.
    ///
    /// With a power line the chip is simply switched off. Without one the
    /// default configuration (not the last levels set) is written back so
    /// the outputs settle in their default state.
    ///
    /// Blocks until everything queued, including earlier level changes, has
    /// reached the chip.
    pub fn suspend(&self) -> Result<()> {
        let (engine, snapshot) = self.active_parts("suspend")?;
        self.state
            .transition(DeviceState::Active, DeviceState::Suspended, "suspend")?;
        if self.has_power_line {
            info!("AW9523B suspend: power down");
            engine.enqueue(Job::PowerDown)?;
        } else {
            info!("AW9523B suspend: restoring default state");
            engine.enqueue_writes(snapshot.register_writes())?;
        }
        engine.flush()
    }

    /// Restores the chip after system resume.
    ///
    /// With a power line the chip lost all registers, so power-up, the reset
    /// pulse and the full cached configuration are queued for the worker.
    /// Without one there is nothing to restore.
    pub fn resume(&self) -> Result<()> {
        let (engine, snapshot) = self.active_parts("resume")?;
        self.state
            .transition(DeviceState::Suspended, DeviceState::Active, "resume")?;
        if self.has_power_line {
            info!("AW9523B resume: restoring configuration");
            engine.enqueue(Job::PowerUp)?;
            engine.enqueue_writes(snapshot.register_writes())
        } else {
            info!("AW9523B resume: nothing to restore");
            Ok(())
        }
    }

    /// Blocks until every write queued so far has been executed (or
    /// dropped after a bus error). Must not be called from a context that
    /// cannot block.
    pub fn flush(&self) -> Result<()> {
        let state = self.state.get();
        if state == DeviceState::Removed {
            return Err(Error::DeviceRemoved);
        }
        self.engine
            .as_ref()
            .ok_or(Error::InvalidState {
                state,
                operation: "flush",
            })?
            .flush()
    }

    /// Stops accepting writes, lets queued writes drain and joins the
    /// worker. Idempotent; also runs on drop.
    pub fn remove(&mut self) {
        let previous = self.state.get();
        self.state.set(DeviceState::Removed);
        if let Some(engine) = self.engine.take() {
            engine.shutdown();
        }
        self.channels.clear();
        *self
            .hardware
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = None;
        if previous != DeviceState::Removed {
            debug!("AW9523B at 0x{:02X} removed", self.address);
        }
    }

    fn active_parts(&self, operation: &'static str) -> Result<(&WriteEngine, &ConfigSnapshot)> {
        match (self.engine.as_ref(), self.snapshot.as_ref()) {
            (Some(engine), Some(snapshot)) => Ok((engine, snapshot)),
            _ => Err(Error::InvalidState {
                state: self.state.get(),
                operation,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DeviceState {
        self.state.get()
    }

    /// 7-bit bus address.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn has_power_line(&self) -> bool {
        self.has_power_line
    }

    /// Number of configured channels (zero after removal).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Exposed name of a channel, `AW.<name>` or `AW.<index>`.
    pub fn channel_name(&self, index: usize) -> Option<&str> {
        self.channels.get(index).map(Channel::name)
    }

    pub fn default_trigger(&self, index: usize) -> Option<&str> {
        self.channels.get(index).and_then(Channel::default_trigger)
    }

    pub fn descriptor(&self, index: usize) -> Option<&PinDescriptor> {
        self.channels.get(index).map(Channel::descriptor)
    }

    /// Last level requested for a channel.
    pub fn level(&self, index: usize) -> Option<u8> {
        self.channels.get(index).map(Channel::level)
    }

    /// Whether a write for the channel is still queued or in flight.
    pub fn is_pending(&self, index: usize) -> Option<bool> {
        let channel = self.channels.get(index)?;
        Some(
            self.engine
                .as_ref()
                .is_some_and(|engine| channel.is_pending(engine.applied())),
        )
    }

    /// Configuration cached at bring-up, replayed on suspend/resume.
    pub fn snapshot(&self) -> Option<&ConfigSnapshot> {
        self.snapshot.as_ref()
    }
}

impl<I2C, PWR, RST, D> Drop for Aw9523b<I2C, PWR, RST, D> {
    fn drop(&mut self) {
        self.remove();
    }
}
