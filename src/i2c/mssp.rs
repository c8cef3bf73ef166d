// Licensed under the Apache-2.0 license

//! Master-mode driver for one MSSP instance.
//!
//! Every primitive first waits for the bus to go idle, then triggers exactly
//! one hardware action. Byte transfers arm the driver's [`AckSignal`] before
//! loading SSPBUF and spin until [`MsspI2c::on_interrupt`] releases it, after
//! which the ACKSTAT bit is returned.
//!
//! Waits are unbounded unless the configuration carries a
//! [`PollBudget::Spins`] limit: an unresponsive bus then surfaces as
//! [`Error::BusTimeout`] instead of hanging the caller. Only one context may
//! run transfer primitives at a time; the driver does not guard against
//! overlapping calls.
//!
//! Bus collisions are cleared and logged by the interrupt handler but not
//! reported to the blocked primitive, and nothing is retried.

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{AckStatus, Direction, I2cConfig, PollBudget};
use crate::i2c::poll::poll_until;
use crate::i2c::registers::{
    intcon, pie1, pie2, pir1, pir2, sspcon1, sspcon2, MsspRegisters, Register, IDLE_MASK,
    RECEIVE_MASK,
};
use crate::i2c::signal::AckSignal;
use crate::i2c::traits::{I2cHardwareCore, I2cMasterPrimitives};
use embedded_hal::i2c::{NoAcknowledgeSource, SevenBitAddress};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The target did not acknowledge a byte.
    NoAcknowledge(NoAcknowledgeSource),
    /// A bounded wait expired before the peripheral settled.
    BusTimeout,
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::ErrorKind;

        match self {
            Self::NoAcknowledge(source) => ErrorKind::NoAcknowledge(*source),
            Self::BusTimeout => ErrorKind::Other,
        }
    }
}

impl From<NoAcknowledgeSource> for Error {
    fn from(source: NoAcknowledgeSource) -> Self {
        Self::NoAcknowledge(source)
    }
}

/// The address byte that follows a (repeated) start condition.
#[must_use]
pub const fn address_byte(address: SevenBitAddress, direction: Direction) -> u8 {
    ((address & 0x7F) << 1) | direction as u8
}

pub struct MsspI2c<R: MsspRegisters, L: Logger = NoOpLogger> {
    regs: R,
    config: I2cConfig,
    ack: AckSignal,
    logger: L,
}

impl<R: MsspRegisters> MsspI2c<R, NoOpLogger> {
    pub const fn new(regs: R, config: I2cConfig) -> Self {
        Self::with_logger(regs, config, NoOpLogger)
    }
}

impl<R: MsspRegisters, L: Logger> MsspI2c<R, L> {
    pub const fn with_logger(regs: R, config: I2cConfig, logger: L) -> Self {
        Self {
            regs,
            config,
            ack: AckSignal::new(),
            logger,
        }
    }

    pub fn config(&self) -> &I2cConfig {
        &self.config
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// Whether a byte transfer is still waiting for its completion interrupt.
    pub fn transfer_pending(&self) -> bool {
        self.ack.is_pending()
    }

    /// Program SSPCON1/SSPSTAT/SSPADD for master mode and open the SSP and
    /// bus-collision interrupt paths.
    pub fn init_master(&self) {
        self.ack.release();

        self.regs.write(Register::Sspcon1, sspcon1::MASTER_MODE);
        self.regs.write(Register::Sspstat, 0);
        self.regs.write(Register::Sspadd, self.config.divisor);

        self.regs.set_bits(Register::Pie1, pie1::SSPIE);
        self.regs.set_bits(Register::Pie2, pie2::BCLIE);
        self.regs.set_bits(Register::Intcon, intcon::PEIE);
        self.regs.set_bits(Register::Intcon, intcon::GIE);
        self.regs.clear_bits(Register::Pir1, pir1::SSPIF);
        self.regs.clear_bits(Register::Pir2, pir2::BCLIF);

        self.logger.debug(format_args!(
            "i2c master: {} Hz from {} Hz core, SSPADD=0x{:02X}",
            self.config.effective_bus_rate().to_Hz(),
            self.config.core_clock.to_Hz(),
            self.config.divisor
        ));
    }

    /// One non-blocking check of the idle condition used by
    /// [`wait_until_idle`](Self::wait_until_idle).
    pub fn poll_idle(&self, mask: u8) -> nb::Result<(), Error> {
        let busy = (self.regs.read(Register::Sspcon2) & sspcon2::BUSY)
            | (self.regs.read(Register::Sspstat) & mask);
        if busy == 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Spin until ACKEN, RCEN, PEN, RSEN and SEN are clear in SSPCON2 and the
    /// `mask` bits are clear in SSPSTAT.
    ///
    /// # Errors
    ///
    /// `Error::BusTimeout` if a bounded poll budget runs out.
    pub fn wait_until_idle(&self, mask: u8) -> Result<(), Error> {
        poll_until(self.budget(), || self.poll_idle(mask), |_| {
            self.logger.warn(format_args!(
                "i2c: bus not idle (SSPCON2=0x{:02X} SSPSTAT=0x{:02X} mask=0x{:02X})",
                self.regs.read(Register::Sspcon2),
                self.regs.read(Register::Sspstat),
                mask
            ));
            Error::BusTimeout
        })
    }

    /// Generate a start condition and address the target.
    ///
    /// # Errors
    ///
    /// `Error::BusTimeout` if a bounded poll budget runs out.
    pub fn start(&self, address: SevenBitAddress, direction: Direction) -> Result<AckStatus, Error> {
        self.condition(sspcon2::SEN)?;
        self.transmit(address_byte(address, direction))
    }

    /// Generate a repeated start condition and address the target.
    ///
    /// # Errors
    ///
    /// `Error::BusTimeout` if a bounded poll budget runs out.
    pub fn repeated_start(
        &self,
        address: SevenBitAddress,
        direction: Direction,
    ) -> Result<AckStatus, Error> {
        self.condition(sspcon2::RSEN)?;
        self.transmit(address_byte(address, direction))
    }

    /// Request a stop condition. The next primitive's idle wait covers its
    /// completion.
    ///
    /// # Errors
    ///
    /// `Error::BusTimeout` if a bounded poll budget runs out.
    pub fn stop(&self) -> Result<(), Error> {
        self.condition(sspcon2::PEN)
    }

    /// # Errors
    ///
    /// `Error::BusTimeout` if a bounded poll budget runs out.
    pub fn send(&self, byte: u8) -> Result<AckStatus, Error> {
        self.transmit(byte)
    }

    /// Receive one byte and answer it with `ack`.
    ///
    /// Returns as soon as the acknowledge sequence has been started.
    ///
    /// # Errors
    ///
    /// `Error::BusTimeout` if a bounded poll budget runs out.
    pub fn receive(&self, ack: AckStatus) -> Result<u8, Error> {
        self.wait_until_idle(IDLE_MASK)?;
        self.regs.set_bits(Register::Sspcon2, sspcon2::RCEN);

        self.wait_until_idle(RECEIVE_MASK)?;
        let byte = self.regs.read(Register::Sspbuf);

        self.wait_until_idle(IDLE_MASK)?;
        match ack {
            AckStatus::Ack => self.regs.clear_bits(Register::Sspcon2, sspcon2::ACKDT),
            AckStatus::Nack => self.regs.set_bits(Register::Sspcon2, sspcon2::ACKDT),
        }
        self.regs.set_bits(Register::Sspcon2, sspcon2::ACKEN);
        Ok(byte)
    }

    /// Interrupt entry: acknowledge SSPIF (releasing a waiting transfer) and
    /// BCLIF. Does nothing else.
    pub fn on_interrupt(&self) {
        if self.regs.is_set(Register::Pir1, pir1::SSPIF) {
            self.ack.release();
            self.regs.clear_bits(Register::Pir1, pir1::SSPIF);
        }
        if self.regs.is_set(Register::Pir2, pir2::BCLIF) {
            self.regs.clear_bits(Register::Pir2, pir2::BCLIF);
            self.logger.warn(format_args!("i2c: bus collision"));
        }
    }

    fn budget(&self) -> PollBudget {
        self.config.poll_budget
    }

    fn condition(&self, enable: u8) -> Result<(), Error> {
        self.wait_until_idle(IDLE_MASK)?;
        self.regs.set_bits(Register::Sspcon2, enable);
        Ok(())
    }

    fn transmit(&self, byte: u8) -> Result<AckStatus, Error> {
        self.wait_until_idle(IDLE_MASK)?;
        self.ack.arm();
        self.regs.write(Register::Sspbuf, byte);
        self.wait_for_completion()?;
        Ok(AckStatus::from_bit(
            self.regs.is_set(Register::Sspcon2, sspcon2::ACKSTAT),
        ))
    }

    fn wait_for_completion(&self) -> Result<(), Error> {
        let step = || {
            if self.ack.is_pending() {
                Err(nb::Error::WouldBlock)
            } else {
                Ok(())
            }
        };
        poll_until(self.budget(), step, |_| {
            // Leave the signal clean for the next transfer.
            self.ack.release();
            self.logger
                .warn(format_args!("i2c: no completion interrupt for transfer"));
            Error::BusTimeout
        })
    }
}

impl<R: MsspRegisters, L: Logger> I2cHardwareCore for MsspI2c<R, L> {
    type Error = Error;

    fn init_master(&self) {
        MsspI2c::init_master(self);
    }

    fn handle_interrupt(&self) {
        self.on_interrupt();
    }

    fn wait_until_idle(&self, mask: u8) -> Result<(), Error> {
        MsspI2c::wait_until_idle(self, mask)
    }
}

impl<R: MsspRegisters, L: Logger> I2cMasterPrimitives for MsspI2c<R, L> {
    fn start(&self, address: SevenBitAddress, direction: Direction) -> Result<AckStatus, Error> {
        MsspI2c::start(self, address, direction)
    }

    fn repeated_start(
        &self,
        address: SevenBitAddress,
        direction: Direction,
    ) -> Result<AckStatus, Error> {
        MsspI2c::repeated_start(self, address, direction)
    }

    fn stop(&self) -> Result<(), Error> {
        MsspI2c::stop(self)
    }

    fn send(&self, byte: u8) -> Result<AckStatus, Error> {
        MsspI2c::send(self, byte)
    }

    fn receive(&self, ack: AckStatus) -> Result<u8, Error> {
        MsspI2c::receive(self, ack)
    }
}
