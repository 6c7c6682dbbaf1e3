//! Cached full register configuration of the chip.
//!
//! The chip loses every register on power loss, so the configuration derived
//! at bring-up is kept here and replayed verbatim on suspend/resume.

use crate::consts::{gcr, reg, MAX_CHANNELS};
use crate::pin::{PinDescriptor, PinMode, LED_MODE};
use log::trace;

/// Port 0 output drive style (global control register bit 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputDrive {
    /// Open-drain outputs. Chip reset value.
    #[default]
    OpenDrain,
    /// Push-pull (totem pole) outputs.
    PushPull,
}

/// Maximum LED drive current as a fraction of Imax (global control bits 1:0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrentRange {
    /// Imax. Chip reset value.
    #[default]
    Full,
    /// 3/4 Imax.
    ThreeQuarters,
    /// 2/4 Imax.
    Half,
    /// 1/4 Imax.
    Quarter,
}

impl CurrentRange {
    fn bits(self) -> u8 {
        match self {
            CurrentRange::Full => gcr::IRANGE_FULL,
            CurrentRange::ThreeQuarters => gcr::IRANGE_3_4,
            CurrentRange::Half => gcr::IRANGE_2_4,
            CurrentRange::Quarter => gcr::IRANGE_1_4,
        }
    }
}

/// A single register write, consumed once by the write engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteTask {
    /// Register address.
    pub register: u8,
    /// Value to store.
    pub value: u8,
}

impl WriteTask {
    pub fn new(register: u8, value: u8) -> Self {
        WriteTask { register, value }
    }
}

/// Current-control registers in the order they are replayed: port 0 first,
/// then port 1 low half, then port 1 high half.
const CC_REPLAY_ORDER: [(u8, u8); MAX_CHANNELS] = [
    (0, 0),
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (0, 5),
    (0, 6),
    (0, 7),
    (1, 0),
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 5),
    (1, 6),
    (1, 7),
];

/// The desired contents of every configuration register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    led_mode_mask: [u8; 2],
    gpio_default_mask: [u8; 2],
    current_defaults: [u8; MAX_CHANNELS],
    output_drive: OutputDrive,
    current_range: CurrentRange,
}

impl ConfigSnapshot {
    /// Aggregates the per-pin descriptors into per-port register values.
    ///
    /// Descriptors must already be validated (mapped). Pins that no
    /// descriptor names stay in LED mode at zero brightness.
    pub fn from_descriptors<'a>(
        descriptors: impl IntoIterator<Item = &'a PinDescriptor>,
        output_drive: OutputDrive,
        current_range: CurrentRange,
    ) -> Self {
        let mut snapshot = ConfigSnapshot {
            led_mode_mask: [0; 2],
            gpio_default_mask: [0; 2],
            current_defaults: [0; MAX_CHANNELS],
            output_drive,
            current_range,
        };
        for desc in descriptors {
            let port = usize::from(desc.port & 0x01);
            match desc.mode {
                PinMode::Gpio => {
                    snapshot.led_mode_mask[port] |= desc.mask();
                    if desc.default_value != 0 {
                        snapshot.gpio_default_mask[port] |= desc.mask();
                    }
                }
                PinMode::Led => {
                    snapshot.current_defaults[port * 8 + usize::from(desc.bit & 0x07)] =
                        desc.default_value;
                }
            }
        }
        trace!("Built config snapshot: {:?}", snapshot);
        snapshot
    }

    /// `LED_MODE` byte for `port`; bit k = 1 means pin k is GPIO.
    pub fn led_mode_mask(&self, port: u8) -> u8 {
        self.led_mode_mask[usize::from(port & 0x01)]
    }

    /// Default GPIO output byte for `port`.
    pub fn gpio_default_mask(&self, port: u8) -> u8 {
        self.gpio_default_mask[usize::from(port & 0x01)]
    }

    /// Default brightness of `(port, bit)`.
    pub fn current_default(&self, port: u8, bit: u8) -> u8 {
        self.current_defaults[usize::from(port & 0x01) * 8 + usize::from(bit & 0x07)]
    }

    pub fn output_drive(&self) -> OutputDrive {
        self.output_drive
    }

    pub fn current_range(&self) -> CurrentRange {
        self.current_range
    }

    /// Value of the global control (drive style) register.
    pub fn global_control(&self) -> u8 {
        let drive = match self.output_drive {
            OutputDrive::OpenDrain => 0,
            OutputDrive::PushPull => gcr::PUSH_PULL,
        };
        drive | (self.current_range.bits() & gcr::IRANGE_MASK)
    }

    /// The full configuration as an ordered register sequence: LED mode
    /// registers, drive style, GPIO defaults, then all 16 current-control
    /// registers.
    pub fn register_writes(&self) -> Vec<WriteTask> {
        let mut writes = Vec::with_capacity(5 + MAX_CHANNELS);
        writes.push(WriteTask::new(LED_MODE[0], self.led_mode_mask[0]));
        writes.push(WriteTask::new(LED_MODE[1], self.led_mode_mask[1]));
        writes.push(WriteTask::new(reg::DRIVE_STYLE, self.global_control()));
        writes.push(WriteTask::new(reg::OUTPUT0, self.gpio_default_mask[0]));
        writes.push(WriteTask::new(reg::OUTPUT1, self.gpio_default_mask[1]));
        for (port, bit) in CC_REPLAY_ORDER {
            // Every (port, bit) in the replay table is a valid LED pin.
            if let Some(register) = crate::pin::resolve_register(port, bit, PinMode::Led) {
                writes.push(WriteTask::new(register, self.current_default(port, bit)));
            }
        }
        writes
    }
}
