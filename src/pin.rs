//! Pin descriptors and the pin-to-register mapping.
//!
//! The AW9523B's current-control registers are not laid out contiguously:
//! port 1 pins 0-3 sit *below* port 0 and port 1 pins 4-7 sit above it.
//! [`resolve_register`] looks addresses up in a table instead of computing
//! offsets so the gap stays visible.

use crate::consts::{reg, PINS_PER_PORT};

/// Operating mode of a single pin.
///
/// The discriminants match the chip's `LED_MODE` register polarity and the
/// mode byte of the packed flag word: 1 = GPIO, 0 = LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PinMode {
    /// Current-controlled (LED) output with 256 dimming steps.
    Led = 0,
    /// Plain two-level digital output.
    Gpio = 1,
}

/// LED current-control register per `[port][bit]`.
const CURRENT_CONTROL: [[u8; 8]; 2] = [
    [
        reg::CC_P0_0,
        reg::CC_P0_1,
        reg::CC_P0_2,
        reg::CC_P0_3,
        reg::CC_P0_4,
        reg::CC_P0_5,
        reg::CC_P0_6,
        reg::CC_P0_7,
    ],
    [
        reg::CC_P1_0,
        reg::CC_P1_1,
        reg::CC_P1_2,
        reg::CC_P1_3,
        reg::CC_P1_4,
        reg::CC_P1_5,
        reg::CC_P1_6,
        reg::CC_P1_7,
    ],
];

/// GPIO output register per port.
const OUTPUT: [u8; 2] = [reg::OUTPUT0, reg::OUTPUT1];

/// LED mode register per port.
pub(crate) const LED_MODE: [u8; 2] = [reg::LED_MODE0, reg::LED_MODE1];

/// Returns the register that controls `(port, bit)` in `mode`, or `None`
/// when the combination does not exist on the chip.
///
/// In GPIO mode every bit of a port shares the port's output register; the
/// bit selects a bit inside that byte.
pub fn resolve_register(port: u8, bit: u8, mode: PinMode) -> Option<u8> {
    if bit >= PINS_PER_PORT {
        return None;
    }
    let port = usize::from(port);
    match mode {
        PinMode::Gpio => OUTPUT.get(port).copied(),
        PinMode::Led => CURRENT_CONTROL.get(port).map(|regs| regs[usize::from(bit)]),
    }
}

/// Where a level change for a resolved pin has to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterTarget {
    /// One bit of a shared GPIO output byte. Needs read-modify-write.
    OutputBit {
        /// Output register of the pin's port.
        register: u8,
        /// Bit mask of the pin inside the register.
        mask: u8,
    },
    /// A dedicated current-control register.
    CurrentControl {
        /// Current-control register of the pin.
        register: u8,
    },
}

impl RegisterTarget {
    /// The register address this target writes.
    pub fn register(&self) -> u8 {
        match *self {
            RegisterTarget::OutputBit { register, .. } => register,
            RegisterTarget::CurrentControl { register } => register,
        }
    }
}

/// Static configuration of one pin, supplied at bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinDescriptor {
    /// Port, 0 or 1.
    pub port: u8,
    /// Bit within the port, 0-7.
    pub bit: u8,
    /// Operating mode.
    pub mode: PinMode,
    /// Default brightness (LED) or level (GPIO, zero = low, non-zero = high).
    pub default_value: u8,
}

impl PinDescriptor {
    /// Describes a GPIO output pin.
    pub fn gpio(port: u8, bit: u8, default_high: bool) -> Self {
        PinDescriptor {
            port,
            bit,
            mode: PinMode::Gpio,
            default_value: u8::from(default_high),
        }
    }

    /// Describes a current-controlled LED pin.
    pub fn led(port: u8, bit: u8, default_brightness: u8) -> Self {
        PinDescriptor {
            port,
            bit,
            mode: PinMode::Led,
            default_value: default_brightness,
        }
    }

    /// Decodes a packed flag word: `port << 24 | bit << 16 | mode << 8 | default`.
    ///
    /// Any non-zero mode byte selects GPIO.
    pub fn from_flags(flags: u32) -> Self {
        let [port, bit, mode, default_value] = flags.to_be_bytes();
        PinDescriptor {
            port,
            bit,
            mode: if mode == PinMode::Led as u8 {
                PinMode::Led
            } else {
                PinMode::Gpio
            },
            default_value,
        }
    }

    /// Encodes the descriptor into the packed flag word.
    pub fn flags(&self) -> u32 {
        u32::from_be_bytes([self.port, self.bit, self.mode as u8, self.default_value])
    }

    /// Register address for this pin, `None` if unmapped.
    pub fn register(&self) -> Option<u8> {
        resolve_register(self.port, self.bit, self.mode)
    }

    /// Classifies the pin's register, `None` if unmapped.
    pub fn target(&self) -> Option<RegisterTarget> {
        let register = self.register()?;
        Some(match self.mode {
            PinMode::Gpio => RegisterTarget::OutputBit {
                register,
                mask: 1 << self.bit,
            },
            PinMode::Led => RegisterTarget::CurrentControl { register },
        })
    }

    /// Bit mask of the pin inside its port's registers.
    #[inline]
    pub fn mask(&self) -> u8 {
        1u8 << (self.bit & 0x07)
    }
}
