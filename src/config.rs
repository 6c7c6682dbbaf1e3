//! Board-level description of how the chip is wired and how its pins are used.

use crate::consts::{DEFAULT_ADDRESS, DEFAULT_QUEUE_DEPTH, MAX_CHANNELS};
use crate::error::{Error, Result};
use crate::pin::PinDescriptor;
use crate::snapshot::{CurrentRange, OutputDrive};

/// Configuration of a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Pin, mode and default value.
    pub descriptor: PinDescriptor,
    /// Label; the channel is exposed as `AW.<name>`, or `AW.<index>` when unset.
    pub name: Option<String>,
    /// Trigger a host LED framework should attach by default.
    pub default_trigger: Option<String>,
}

impl ChannelConfig {
    pub fn new(descriptor: PinDescriptor) -> Self {
        ChannelConfig {
            descriptor,
            name: None,
            default_trigger: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.default_trigger = Some(trigger.into());
        self
    }
}

impl From<PinDescriptor> for ChannelConfig {
    fn from(descriptor: PinDescriptor) -> Self {
        ChannelConfig::new(descriptor)
    }
}

/// Everything needed to bring up one AW9523B, apart from the bus and the
/// control lines themselves.
///
/// ```
/// use aw9523b_leds::{ChannelConfig, LedsConfig, OutputDrive, PinDescriptor};
///
/// let config = LedsConfig::new()
///     .address(0x59)
///     .output_drive(OutputDrive::PushPull)
///     .channel(ChannelConfig::new(PinDescriptor::led(0, 0, 0x20)).name("status"))
///     .channel(PinDescriptor::gpio(1, 4, false));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedsConfig {
    /// 7-bit I2C address.
    pub address: u8,
    /// Port 0 output drive style.
    pub output_drive: OutputDrive,
    /// Global LED current limit.
    pub current_range: CurrentRange,
    /// Capacity of the deferred write queue.
    pub queue_depth: usize,
    /// Channels, indexed in order. At most 16.
    pub channels: Vec<ChannelConfig>,
}

impl Default for LedsConfig {
    fn default() -> Self {
        LedsConfig {
            address: DEFAULT_ADDRESS,
            output_drive: OutputDrive::default(),
            current_range: CurrentRange::default(),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            channels: Vec::new(),
        }
    }
}

impl LedsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn output_drive(mut self, drive: OutputDrive) -> Self {
        self.output_drive = drive;
        self
    }

    pub fn current_range(mut self, range: CurrentRange) -> Self {
        self.current_range = range;
        self
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    /// Appends a channel; its index is the number of channels before it.
    pub fn channel(mut self, channel: impl Into<ChannelConfig>) -> Self {
        self.channels.push(channel.into());
        self
    }

    /// Builds channels from packed flag words, in order.
    pub fn from_flags(flags: &[u32]) -> Self {
        flags.iter().fold(Self::new(), |config, &f| {
            config.channel(PinDescriptor::from_flags(f))
        })
    }

    /// Checks limits that do not depend on the pin mapping.
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() || self.channels.len() > MAX_CHANNELS {
            return Err(Error::ChannelCount(self.channels.len()));
        }
        if self.address > 0x7F {
            return Err(Error::ArgumentOutOfRange(format!(
                "7-bit I2C address 0x{:02X} must be 0-127",
                self.address
            )));
        }
        if self.queue_depth == 0 {
            return Err(Error::ArgumentOutOfRange(
                "Write queue depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
