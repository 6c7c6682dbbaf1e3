//! Register addresses, bit definitions and timing constants for the AW9523B.

/// Default 7-bit I2C address (AD0 = AD1 = 0). The address pins select 0x58-0x5B.
pub const DEFAULT_ADDRESS: u8 = 0x58;

/// Value read back from [`reg::IDENTITY`] on a genuine AW9523B.
pub const CHIP_ID: u8 = 0x23;

/// Number of pins (channels) on the chip, 8 per port.
pub const MAX_CHANNELS: usize = 16;
/// Pins per port.
pub const PINS_PER_PORT: u8 = 8;

/// Default capacity of the deferred write queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

// --- Register Map ---
pub mod reg {
    pub const INPUT0: u8 = 0x00;
    pub const INPUT1: u8 = 0x01;
    /// GPIO output level, port 0. One bit per pin.
    pub const OUTPUT0: u8 = 0x02;
    /// GPIO output level, port 1.
    pub const OUTPUT1: u8 = 0x03;
    pub const DIR0: u8 = 0x04;
    pub const DIR1: u8 = 0x05;
    pub const INT_EN0: u8 = 0x06;
    pub const INT_EN1: u8 = 0x07;
    /// Chip identity, reads [`CHIP_ID`](super::CHIP_ID).
    pub const IDENTITY: u8 = 0x10;
    /// Global control register: output drive style and LED current range.
    pub const DRIVE_STYLE: u8 = 0x11;
    /// Bit k = 1 means pin k of port 0 is GPIO, 0 means LED.
    pub const LED_MODE0: u8 = 0x12;
    /// Bit k = 1 means pin k of port 1 is GPIO, 0 means LED.
    pub const LED_MODE1: u8 = 0x13;

    // Current-control (dimming) registers. Not contiguous across ports.
    pub const CC_P1_0: u8 = 0x20;
    pub const CC_P1_1: u8 = 0x21;
    pub const CC_P1_2: u8 = 0x22;
    pub const CC_P1_3: u8 = 0x23;
    pub const CC_P0_0: u8 = 0x24;
    pub const CC_P0_1: u8 = 0x25;
    pub const CC_P0_2: u8 = 0x26;
    pub const CC_P0_3: u8 = 0x27;
    pub const CC_P0_4: u8 = 0x28;
    pub const CC_P0_5: u8 = 0x29;
    pub const CC_P0_6: u8 = 0x2A;
    pub const CC_P0_7: u8 = 0x2B;
    pub const CC_P1_4: u8 = 0x2C;
    pub const CC_P1_5: u8 = 0x2D;
    pub const CC_P1_6: u8 = 0x2E;
    pub const CC_P1_7: u8 = 0x2F;

    /// Writing 0x00 resets every register to its power-on value.
    pub const SOFT_RESET: u8 = 0x7F;
}

// --- Global Control Register (0x11) bits ---
pub mod gcr {
    /// Port 0 output drive: 1 = push-pull, 0 = open-drain.
    pub const PUSH_PULL: u8 = 1 << 4;
    pub const IRANGE_MASK: u8 = 0b0000_0011;

    // LED current range (ISEL), fraction of Imax
    pub const IRANGE_FULL: u8 = 0b00;
    pub const IRANGE_3_4: u8 = 0b01;
    pub const IRANGE_2_4: u8 = 0b10;
    pub const IRANGE_1_4: u8 = 0b11;
}

// --- Power and reset sequencing ---
pub mod timing {
    /// Settle time after the power line is switched on.
    pub const POWER_STABLE_MS: u32 = 1;
    /// Reset line held low for this long.
    pub const RESET_ASSERT_US: u32 = 30;
    /// Wait after releasing reset before the first bus access.
    pub const RESET_RELEASE_US: u32 = 5;
    /// Resume pulse: reset driven high for this long first.
    pub const RESUME_RESET_PRE_US: u32 = 50;
    /// Resume pulse: reset held low.
    pub const RESUME_RESET_ASSERT_US: u32 = 100;
}
