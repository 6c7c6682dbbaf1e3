//! # aw9523b-leds
//!
//! A Rust crate for driving the pins of an Awinic AW9523B 16-channel I/O
//! expander as LED (current-controlled) or plain GPIO outputs over I²C.
//!
//! The bus, the optional power and reset lines and the delay source are
//! taken as [`embedded-hal`](https://docs.rs/embedded-hal) 1.0 traits, so
//! any HAL (or a Linux `i2cdev`/`gpio-cdev` adapter) can be plugged in.
//!
//! ## Features
//!
//! *   Per-pin configuration with [`PinDescriptor`] (port, bit, mode,
//!     default value), including the packed 32-bit flag word form.
//! *   Exact mapping of pins onto the chip's non-contiguous current-control
//!     registers ([`resolve_register`]).
//! *   Non-blocking level changes ([`Aw9523b::set_level`]): register writes
//!     are queued and applied in order by a dedicated worker thread.
//!     GPIO outputs use read-modify-write on the worker, so channels sharing
//!     an output register never lose updates.
//! *   Bring-up with power/reset sequencing and identity check.
//! *   Suspend/resume: the configuration cached at bring-up
//!     ([`ConfigSnapshot`]) is replayed after the chip loses power.
//! *   Configurable output drive (open-drain / push-pull) and LED current
//!     range.
//!
//! ## Limitations
//!
//! *   Outputs only. Input reading, pin direction and interrupts are not
//!     handled; the registers are listed in [`consts::reg`] for reference.
//! *   One chip per driver instance; bus sharing is up to the `I2c`
//!     implementation.
//! *   Failed deferred writes are logged and dropped, not retried. The next
//!     resume replays the full configuration.
//!
//! ## Basic Usage
//!
//! ```ignore
//! use aw9523b_leds::{Aw9523b, ChannelConfig, LedsConfig, NoPin, OutputDrive, PinDescriptor};
//! # let (i2c, reset_pin, delay) = todo!();
//!
//! let config = LedsConfig::new()
//!     .output_drive(OutputDrive::PushPull)
//!     .channel(ChannelConfig::new(PinDescriptor::led(0, 0, 0)).name("status"))
//!     .channel(PinDescriptor::gpio(1, 4, false));
//!
//! let mut leds = Aw9523b::new(config, i2c, None::<NoPin>, Some(reset_pin), delay)?;
//! leds.bring_up()?;
//!
//! leds.set_level(0, 128)?; // LED at half brightness
//! leds.set_level(1, 1)?; // GPIO high
//!
//! leds.suspend()?;
//! leds.resume()?;
//! leds.remove();
//! ```
//!
//! ## Hardware Setup Notes
//!
//! *   **Address:** 0x58 with AD0 = AD1 = 0, up to 0x5B.
//! *   **Reset:** RSTN is active low. When wired, it is pulsed low for
//!     30 µs at bring-up; on resume (power line present) it is driven high
//!     for 50 µs, then low for 100 µs.
//! *   **Power line:** Optional. When present the chip is switched off on
//!     suspend and fully reconfigured on resume.
//! *   **Drive mode:** Port 0 defaults to open-drain; LED pins sink current
//!     regardless.
//!
//! ## License
//!
//! This project is licensed under the WTFPL.

mod bus;
mod channel;
mod config;
pub mod consts;
mod device;
mod error;
pub mod pin;
mod snapshot;
mod worker;

pub use bus::NoPin;
pub use config::{ChannelConfig, LedsConfig};
pub use consts::{CHIP_ID, DEFAULT_ADDRESS, MAX_CHANNELS};
pub use device::{Aw9523b, DeviceState};
pub use error::{ControlLine, Error, Result};
pub use pin::{resolve_register, PinDescriptor, PinMode, RegisterTarget};
pub use snapshot::{ConfigSnapshot, CurrentRange, OutputDrive, WriteTask};
