// Licensed under the Apache-2.0 license

//! # I2C Hardware Abstraction Traits
//!
//! Two layers, so transaction logic can be written once against any
//! controller that speaks the classic byte-at-a-time master protocol:
//!
//! ```text
//! I2cHardwareCore (setup, idle wait, interrupt entry)
//!     └── I2cMasterPrimitives (start / repeated start / stop / send / receive)
//! ```
//!
//! All methods take `&self`. The same instance is reached from the main
//! context and from the interrupt vector, so implementations keep their
//! mutable state in atomics or hardware registers.

use crate::i2c::common::{AckStatus, Direction};
use embedded_hal::i2c::SevenBitAddress;

/// Setup and synchronisation shared by every master implementation.
///
/// # Examples
///
/// ```rust,ignore
/// use mssp_i2c::i2c::{I2cHardwareCore, IDLE_MASK};
///
/// fn bring_up<T: I2cHardwareCore>(bus: &T) -> Result<(), T::Error> {
///     bus.init_master();
///     bus.wait_until_idle(IDLE_MASK)
/// }
/// ```
pub trait I2cHardwareCore {
    /// Hardware-specific error type that implements embedded-hal error traits
    type Error: embedded_hal::i2c::Error + core::fmt::Debug;

    /// Program the peripheral as bus master and enable its interrupts.
    ///
    /// Must run once before any transfer primitive.
    fn init_master(&self);

    /// Entry point for the platform interrupt dispatcher.
    ///
    /// Clears the peripheral's own completion and collision flags and releases
    /// a waiting primitive. Never blocks.
    fn handle_interrupt(&self);

    /// Spin until no bus sequence is in progress and the status bits in
    /// `mask` are clear.
    ///
    /// # Errors
    ///
    /// Only when the implementation is configured with a bounded wait and
    /// the bus never settles.
    fn wait_until_idle(&self, mask: u8) -> Result<(), Self::Error>;
}

/// Byte-level master operations.
///
/// Acknowledge failures are not errors at this level: the sampled ACK bit is
/// returned and the caller decides what a NACK means.
pub trait I2cMasterPrimitives: I2cHardwareCore {
    /// Generate a start condition and send `address` with `direction`.
    ///
    /// # Errors
    ///
    /// Bus timeout, when a bounded wait is configured.
    fn start(&self, address: SevenBitAddress, direction: Direction) -> Result<AckStatus, Self::Error>;

    /// Like [`start`](Self::start) but without releasing the bus first.
    ///
    /// # Errors
    ///
    /// Bus timeout, when a bounded wait is configured.
    fn repeated_start(
        &self,
        address: SevenBitAddress,
        direction: Direction,
    ) -> Result<AckStatus, Self::Error>;

    /// Request a stop condition. Returns without waiting for it to finish.
    ///
    /// # Errors
    ///
    /// Bus timeout, when a bounded wait is configured.
    fn stop(&self) -> Result<(), Self::Error>;

    /// Transmit one byte and report the target's acknowledge.
    ///
    /// # Errors
    ///
    /// Bus timeout, when a bounded wait is configured.
    fn send(&self, byte: u8) -> Result<AckStatus, Self::Error>;

    /// Clock in one byte, then answer it with `ack` (`Ack` to ask for more,
    /// `Nack` after the last byte).
    ///
    /// # Errors
    ///
    /// Bus timeout, when a bounded wait is configured.
    fn receive(&self, ack: AckStatus) -> Result<u8, Self::Error>;
}

impl<T: I2cHardwareCore + ?Sized> I2cHardwareCore for &T {
    type Error = T::Error;

    fn init_master(&self) {
        (**self).init_master();
    }

    fn handle_interrupt(&self) {
        (**self).handle_interrupt();
    }

    fn wait_until_idle(&self, mask: u8) -> Result<(), Self::Error> {
        (**self).wait_until_idle(mask)
    }
}

impl<T: I2cMasterPrimitives + ?Sized> I2cMasterPrimitives for &T {
    fn start(&self, address: SevenBitAddress, direction: Direction) -> Result<AckStatus, Self::Error> {
        (**self).start(address, direction)
    }

    fn repeated_start(
        &self,
        address: SevenBitAddress,
        direction: Direction,
    ) -> Result<AckStatus, Self::Error> {
        (**self).repeated_start(address, direction)
    }

    fn stop(&self) -> Result<(), Self::Error> {
        (**self).stop()
    }

    fn send(&self, byte: u8) -> Result<AckStatus, Self::Error> {
        (**self).send(byte)
    }

    fn receive(&self, ack: AckStatus) -> Result<u8, Self::Error> {
        (**self).receive(ack)
    }
}
