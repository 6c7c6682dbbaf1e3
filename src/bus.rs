//! Register and control-line access for one chip.
//!
//! Everything in here blocks. Before bring-up completes it runs on the
//! caller's thread; afterwards the [`Hardware`] is owned by the write worker.

use crate::consts::timing;
use crate::error::{self, ControlLine, Result};
use crate::worker::JobTarget;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::I2c;
use log::{debug, trace};
use std::convert::Infallible;

/// Placeholder for a control line that is not wired.
///
/// Pass `None::<NoPin>` for a missing power or reset line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl digital::ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> std::result::Result<(), Self::Error> {
        Ok(())
    }
    fn set_high(&mut self) -> std::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Bus handle, address and control lines of one AW9523B.
pub(crate) struct Hardware<I2C, PWR, RST, D> {
    i2c: I2C,
    address: u8,
    power: Option<PWR>,
    reset: Option<RST>,
    delay: D,
}

impl<I2C, PWR, RST, D> Hardware<I2C, PWR, RST, D>
where
    I2C: I2c,
    PWR: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    pub(crate) fn new(
        i2c: I2C,
        address: u8,
        power: Option<PWR>,
        reset: Option<RST>,
        delay: D,
    ) -> Self {
        Self {
            i2c,
            address,
            power,
            reset,
            delay,
        }
    }

    pub(crate) fn address(&self) -> u8 {
        self.address
    }

    pub(crate) fn read(&mut self, register: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| error::bus_read(register, e))?;
        trace!("Read reg 0x{:02X} = 0x{:02X}", register, buf[0]);
        Ok(buf[0])
    }

    pub(crate) fn write(&mut self, register: u8, value: u8) -> Result<()> {
        trace!("Writing reg 0x{:02X} = 0x{:02X}", register, value);
        self.i2c
            .write(self.address, &[register, value])
            .map_err(|e| error::bus_write(register, value, e))
    }

    /// Switches the supply on and waits for it to settle. No-op without a
    /// power line.
    pub(crate) fn power_on(&mut self) -> Result<()> {
        if let Some(power) = self.power.as_mut() {
            debug!("Power line on");
            power
                .set_high()
                .map_err(|e| error::line(ControlLine::Power, e))?;
            self.delay.delay_ms(timing::POWER_STABLE_MS);
        }
        Ok(())
    }

    /// Switches the supply off. No-op without a power line.
    pub(crate) fn power_off(&mut self) -> Result<()> {
        if let Some(power) = self.power.as_mut() {
            debug!("Power line off");
            power
                .set_low()
                .map_err(|e| error::line(ControlLine::Power, e))?;
        }
        Ok(())
    }

    /// Pulses the active-low reset line. No-op without a reset line.
    pub(crate) fn reset_pulse(&mut self) -> Result<()> {
        if let Some(reset) = self.reset.as_mut() {
            debug!(
                "Pulsing reset ({}us low, {}us settle)",
                timing::RESET_ASSERT_US,
                timing::RESET_RELEASE_US
            );
            reset
                .set_low()
                .map_err(|e| error::line(ControlLine::Reset, e))?;
            self.delay.delay_us(timing::RESET_ASSERT_US);
            reset
                .set_high()
                .map_err(|e| error::line(ControlLine::Reset, e))?;
            self.delay.delay_us(timing::RESET_RELEASE_US);
        }
        Ok(())
    }

    /// Reset pulse used after resume: high, then low, then released. No
    /// settle wait follows; the first replayed write comes after the queue
    /// hand-off. No-op without a reset line.
    pub(crate) fn resume_reset_pulse(&mut self) -> Result<()> {
        if let Some(reset) = self.reset.as_mut() {
            debug!(
                "Pulsing reset for resume ({}us high, {}us low)",
                timing::RESUME_RESET_PRE_US,
                timing::RESUME_RESET_ASSERT_US
            );
            reset
                .set_high()
                .map_err(|e| error::line(ControlLine::Reset, e))?;
            self.delay.delay_us(timing::RESUME_RESET_PRE_US);
            reset
                .set_low()
                .map_err(|e| error::line(ControlLine::Reset, e))?;
            self.delay.delay_us(timing::RESUME_RESET_ASSERT_US);
            reset
                .set_high()
                .map_err(|e| error::line(ControlLine::Reset, e))?;
        }
        Ok(())
    }
}

impl<I2C, PWR, RST, D> JobTarget for Hardware<I2C, PWR, RST, D>
where
    I2C: I2c,
    PWR: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    fn read_register(&mut self, register: u8) -> Result<u8> {
        self.read(register)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<()> {
        self.write(register, value)
    }

    fn power_up(&mut self) -> Result<()> {
        self.power_on()?;
        self.resume_reset_pulse()
    }

    fn power_down(&mut self) -> Result<()> {
        self.power_off()
    }
}
