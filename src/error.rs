use crate::device::DeviceState;
use crate::pin::PinMode;
use embedded_hal::{digital, i2c};
use std::fmt;
use thiserror::Error;

/// Identifies one of the optional control lines wired to the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLine {
    /// Line switching the chip's supply.
    Power,
    /// Active-low RSTN line.
    Reset,
}

impl fmt::Display for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlLine::Power => write!(f, "power"),
            ControlLine::Reset => write!(f, "reset"),
        }
    }
}

/// Errors that can occur when configuring or driving an AW9523B.
///
/// Transport failures only surface here for operations that run on the
/// caller's thread (bring-up). Failures of deferred writes are logged by the
/// worker and never reach the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a register over I2C failed.
    #[error("I2C read of register 0x{register:02X} failed: {kind:?}")]
    BusRead {
        /// Register that was being read.
        register: u8,
        /// Error reported by the bus implementation.
        kind: i2c::ErrorKind,
    },
    /// Writing a register over I2C failed.
    #[error("I2C write of 0x{value:02X} to register 0x{register:02X} failed: {kind:?}")]
    BusWrite {
        /// Register that was being written.
        register: u8,
        /// Value that was being written.
        value: u8,
        /// Error reported by the bus implementation.
        kind: i2c::ErrorKind,
    },
    /// The identity register did not hold the AW9523B chip ID.
    #[error(
        "No AW9523B detected: identity register read 0x{found:02X} (expected 0x{expected:02X}). Check power, reset wiring and bus address."
    )]
    IdentityMismatch {
        /// Value read from the identity register.
        found: u8,
        /// Expected chip ID.
        expected: u8,
    },
    /// A channel's port/bit/mode combination has no register on the chip.
    #[error("Channel {channel}: pin P{port}_{bit} has no register in {mode:?} mode")]
    UnmappedPin {
        /// Index of the offending channel in the configuration.
        channel: usize,
        /// Configured port.
        port: u8,
        /// Configured bit.
        bit: u8,
        /// Configured mode.
        mode: PinMode,
    },
    /// Channel index does not name a configured channel.
    #[error("Channel index {index} out of range ({count} channels configured)")]
    InvalidChannelIndex {
        /// Index that was requested.
        index: usize,
        /// Number of configured channels.
        count: usize,
    },
    /// The configuration holds no channels or more than the chip has.
    #[error("Channel count {0} out of range (1-16)")]
    ChannelCount(usize),
    /// Function argument is outside the valid range.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// A power or reset line could not be driven.
    #[error("Failed to drive {line} line: {kind:?}")]
    Line {
        /// Which line failed.
        line: ControlLine,
        /// Error reported by the pin implementation.
        kind: digital::ErrorKind,
    },
    /// The operation is not allowed in the device's current lifecycle state.
    #[error("Cannot {operation} while device is {state:?}")]
    InvalidState {
        /// Current lifecycle state.
        state: DeviceState,
        /// Operation that was attempted.
        operation: &'static str,
    },
    /// The deferred write queue has no room; the request was not enqueued.
    #[error("Write queue full")]
    QueueFull,
    /// The device was removed; no further writes are accepted.
    #[error("Device removed")]
    DeviceRemoved,
    /// General I/O error (e.g. the worker thread could not be spawned).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for AW9523B operations.
///
/// This is a convenience alias for `std::result::Result<T, Error>` used
/// throughout the crate to reduce boilerplate.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn bus_read<E: i2c::Error>(register: u8, e: E) -> Error {
    Error::BusRead {
        register,
        kind: e.kind(),
    }
}

pub(crate) fn bus_write<E: i2c::Error>(register: u8, value: u8, e: E) -> Error {
    Error::BusWrite {
        register,
        value,
        kind: e.kind(),
    }
}

pub(crate) fn line<E: digital::Error>(line: ControlLine, e: E) -> Error {
    Error::Line {
        line,
        kind: e.kind(),
    }
}
