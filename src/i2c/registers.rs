// Licensed under the Apache-2.0 license

//! MSSP register identifiers, bit fields and access paths.
//!
//! The driver never touches memory directly: it goes through
//! [`MsspRegisters`], which real hardware satisfies with [`Pic18Mmio`] and host
//! tests satisfy with the simulated peripheral in `sim`.

use core::ptr::{read_volatile, write_volatile};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    Sspcon1,
    Sspcon2,
    Sspstat,
    Sspadd,
    Sspbuf,
    Pir1,
    Pie1,
    Pir2,
    Pie2,
    Intcon,
}

impl Register {
    pub const COUNT: usize = 10;

    pub const ALL: [Register; Register::COUNT] = [
        Register::Sspcon1,
        Register::Sspcon2,
        Register::Sspstat,
        Register::Sspadd,
        Register::Sspbuf,
        Register::Pir1,
        Register::Pie1,
        Register::Pir2,
        Register::Pie2,
        Register::Intcon,
    ];

    /// Dense index, `0..COUNT`.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

pub mod sspcon1 {
    /// Serial port enable.
    pub const SSPEN: u8 = 1 << 5;
    /// SSPM<3:0> = 1000: I2C master, clock = Fosc / (4 * (SSPADD + 1)).
    pub const SSPM_I2C_MASTER: u8 = 0b1000;
    pub const MASTER_MODE: u8 = SSPEN | SSPM_I2C_MASTER;
}

pub mod sspcon2 {
    pub const GCEN: u8 = 1 << 7;
    pub const ACKSTAT: u8 = 1 << 6;
    pub const ACKDT: u8 = 1 << 5;
    pub const ACKEN: u8 = 1 << 4;
    pub const RCEN: u8 = 1 << 3;
    pub const PEN: u8 = 1 << 2;
    pub const RSEN: u8 = 1 << 1;
    pub const SEN: u8 = 1 << 0;
    /// Every self-clearing "sequence in progress" enable.
    pub const BUSY: u8 = ACKEN | RCEN | PEN | RSEN | SEN;
}

pub mod sspstat {
    pub const SMP: u8 = 1 << 7;
    pub const CKE: u8 = 1 << 6;
    pub const D_A: u8 = 1 << 5;
    pub const P: u8 = 1 << 4;
    pub const S: u8 = 1 << 3;
    /// In master mode: a transmit is in progress.
    pub const R_W: u8 = 1 << 2;
    pub const UA: u8 = 1 << 1;
    pub const BF: u8 = 1 << 0;
}

pub mod pir1 {
    pub const SSPIF: u8 = 1 << 3;
}

pub mod pie1 {
    pub const SSPIE: u8 = 1 << 3;
}

pub mod pir2 {
    pub const BCLIF: u8 = 1 << 3;
}

pub mod pie2 {
    pub const BCLIE: u8 = 1 << 3;
}

pub mod intcon {
    pub const GIE: u8 = 1 << 7;
    pub const PEIE: u8 = 1 << 6;
}

/// SSPSTAT bits that must be clear before a new command: no transmit in
/// progress and nothing left in the buffer.
pub const IDLE_MASK: u8 = sspstat::R_W | sspstat::BF;

/// SSPSTAT bits polled while a receive is running. BF is left out because it
/// is exactly what a finished receive sets.
pub const RECEIVE_MASK: u8 = sspstat::R_W;

/// Byte-wide access to the MSSP register file.
///
/// Reads of `Sspbuf` have a side effect on hardware (they clear BF), so
/// the read-modify-write helpers must not be used on it.
pub trait MsspRegisters {
    fn read(&self, reg: Register) -> u8;

    fn write(&self, reg: Register, value: u8);

    fn set_bits(&self, reg: Register, mask: u8) {
        self.write(reg, self.read(reg) | mask);
    }

    fn clear_bits(&self, reg: Register, mask: u8) {
        self.write(reg, self.read(reg) & !mask);
    }

    fn is_set(&self, reg: Register, mask: u8) -> bool {
        self.read(reg) & mask != 0
    }
}

impl<T: MsspRegisters + ?Sized> MsspRegisters for &T {
    fn read(&self, reg: Register) -> u8 {
        (**self).read(reg)
    }

    fn write(&self, reg: Register, value: u8) {
        (**self).write(reg, value);
    }

    fn set_bits(&self, reg: Register, mask: u8) {
        (**self).set_bits(reg, mask);
    }

    fn clear_bits(&self, reg: Register, mask: u8) {
        (**self).clear_bits(reg, mask);
    }

    fn is_set(&self, reg: Register, mask: u8) -> bool {
        (**self).is_set(reg, mask)
    }
}

/// Absolute addresses of the registers the driver uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterMap {
    pub sspcon1: usize,
    pub sspcon2: usize,
    pub sspstat: usize,
    pub sspadd: usize,
    pub sspbuf: usize,
    pub pir1: usize,
    pub pie1: usize,
    pub pir2: usize,
    pub pie2: usize,
    pub intcon: usize,
}

impl RegisterMap {
    pub const PIC18F4550: RegisterMap = RegisterMap {
        sspcon1: 0xFC6,
        sspcon2: 0xFC5,
        sspstat: 0xFC7,
        sspadd: 0xFC8,
        sspbuf: 0xFC9,
        pir1: 0xF9E,
        pie1: 0xF9D,
        pir2: 0xFA1,
        pie2: 0xFA0,
        intcon: 0xFF2,
    };

    #[must_use]
    pub const fn address(&self, reg: Register) -> usize {
        match reg {
            Register::Sspcon1 => self.sspcon1,
            Register::Sspcon2 => self.sspcon2,
            Register::Sspstat => self.sspstat,
            Register::Sspadd => self.sspadd,
            Register::Sspbuf => self.sspbuf,
            Register::Pir1 => self.pir1,
            Register::Pie1 => self.pie1,
            Register::Pir2 => self.pir2,
            Register::Pie2 => self.pie2,
            Register::Intcon => self.intcon,
        }
    }
}

/// Volatile memory-mapped access through a [`RegisterMap`].
pub struct Pic18Mmio {
    map: RegisterMap,
}

impl Pic18Mmio {
    /// # Safety
    ///
    /// Every address in `map` must be a valid, byte-accessible MSSP (or
    /// interrupt controller) register for as long as the value is used, and
    /// nothing else may drive the same peripheral.
    #[must_use]
    pub const unsafe fn new(map: RegisterMap) -> Self {
        Self { map }
    }

    #[must_use]
    pub const fn map(&self) -> &RegisterMap {
        &self.map
    }
}

impl MsspRegisters for Pic18Mmio {
    fn read(&self, reg: Register) -> u8 {
        // SAFETY: address validity is the contract of `Pic18Mmio::new`.
        unsafe { read_volatile(self.map.address(reg) as *const u8) }
    }

    fn write(&self, reg: Register, value: u8) {
        // SAFETY: address validity is the contract of `Pic18Mmio::new`.
        unsafe { write_volatile(self.map.address(reg) as *mut u8, value) }
    }
}
