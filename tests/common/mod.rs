//! Stateful stand-in for an AW9523B plus its power/reset lines and delay.
//!
//! All parts share one [`Bench`] so tests can check the exact interleaving
//! of line changes, delays and register accesses.

#![allow(dead_code)]

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

pub const ADDR: u8 = 0x58;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Read(u8, u8),
    Write(u8, u8),
    FailedWrite(u8, u8),
    Power(bool),
    Reset(bool),
    DelayNs(u32),
    DelayUs(u32),
    DelayMs(u32),
}

struct Chip {
    identity: u8,
    powered: bool,
    regs: [u8; 256],
    fail_writes: HashSet<u8>,
    events: Vec<Event>,
}

impl Chip {
    fn reset_registers(&mut self) {
        self.regs = [0; 256];
        self.regs[0x10] = self.identity;
    }
}

/// Shared handle to the simulated chip.
///
/// Every bus transaction first takes `gate`, so a test holding it stalls the
/// write worker.
#[derive(Clone)]
pub struct Bench {
    chip: Arc<Mutex<Chip>>,
    gate: Arc<Mutex<()>>,
}

impl Bench {
    /// A powered chip that answers with the genuine identity.
    pub fn new() -> Self {
        Self::with_identity(0x23)
    }

    pub fn with_identity(identity: u8) -> Self {
        let mut chip = Chip {
            identity,
            powered: true,
            regs: [0; 256],
            fail_writes: HashSet::new(),
            events: Vec::new(),
        };
        chip.reset_registers();
        Bench {
            chip: Arc::new(Mutex::new(chip)),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Chip starts unpowered; it only answers once the power line goes high.
    pub fn unpowered(self) -> Self {
        self.chip().powered = false;
        self
    }

    fn chip(&self) -> MutexGuard<'_, Chip> {
        self.chip.lock().unwrap()
    }

    /// Blocks every bus transaction until the returned guard is dropped.
    pub fn hold_bus(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap()
    }

    pub fn i2c(&self) -> FakeI2c {
        FakeI2c(self.clone())
    }

    pub fn power_line(&self) -> FakeLine {
        FakeLine {
            bench: self.clone(),
            power: true,
        }
    }

    pub fn reset_line(&self) -> FakeLine {
        FakeLine {
            bench: self.clone(),
            power: false,
        }
    }

    pub fn delay(&self) -> FakeDelay {
        FakeDelay(self.clone())
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.chip().regs[usize::from(reg)]
    }

    pub fn set_register(&self, reg: u8, value: u8) {
        self.chip().regs[usize::from(reg)] = value;
    }

    pub fn is_powered(&self) -> bool {
        self.chip().powered
    }

    pub fn fail_writes_to(&self, reg: u8) {
        self.chip().fail_writes.insert(reg);
    }

    pub fn events(&self) -> Vec<Event> {
        self.chip().events.clone()
    }

    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut self.chip().events)
    }

    /// Successful register writes, in order.
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(reg, value) => Some((reg, value)),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeI2c(Bench);

impl i2c::ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let _gate = self.0.hold_bus();
        let mut chip = self.0.chip();
        if address != ADDR || !chip.powered {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        let mut pointer = 0u8;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    let Some((&reg, data)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = reg;
                    for &value in data {
                        if chip.fail_writes.contains(&pointer) {
                            chip.events.push(Event::FailedWrite(pointer, value));
                            return Err(ErrorKind::Other);
                        }
                        // Identity is read-only.
                        if pointer != 0x10 {
                            chip.regs[usize::from(pointer)] = value;
                        }
                        chip.events.push(Event::Write(pointer, value));
                        pointer = pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = chip.regs[usize::from(pointer)];
                        chip.events.push(Event::Read(pointer, *byte));
                        pointer = pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Power or reset line. Power low cuts the chip's supply; reset low clears
/// its registers.
pub struct FakeLine {
    bench: Bench,
    power: bool,
}

impl digital::ErrorType for FakeLine {
    type Error = Infallible;
}

impl OutputPin for FakeLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.bench.chip();
        if self.power {
            chip.powered = false;
            chip.events.push(Event::Power(false));
        } else {
            chip.events.push(Event::Reset(false));
        }
        chip.reset_registers();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut chip = self.bench.chip();
        if self.power {
            chip.powered = true;
            chip.events.push(Event::Power(true));
        } else {
            chip.events.push(Event::Reset(true));
        }
        Ok(())
    }
}

pub struct FakeDelay(Bench);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.chip().events.push(Event::DelayNs(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.chip().events.push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.chip().events.push(Event::DelayMs(ms));
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
