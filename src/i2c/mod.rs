// Licensed under the Apache-2.0 license

//! MSSP I2C driver module.
//!
//! Master-mode bus primitives for the PIC18 MSSP peripheral, written for
//! bare-metal `no_std` targets. Register access is abstracted so the same
//! control flow runs against the simulated peripheral on a host.

pub mod common;
pub mod i2c_controller;
pub mod mssp;
pub mod poll;
pub mod registers;
pub mod signal;
pub mod traits;

#[cfg(any(test, feature = "std"))]
pub mod sim;

pub use common::{
    baud_divisor, AckStatus, ConfigurationError, Direction, I2cConfig, I2cConfigBuilder, I2cSpeed,
    PollBudget,
};
pub use i2c_controller::I2cController;
pub use mssp::{Error, MsspI2c};
pub use registers::{MsspRegisters, Pic18Mmio, Register, RegisterMap, IDLE_MASK, RECEIVE_MASK};
pub use signal::AckSignal;
pub use traits::{I2cHardwareCore, I2cMasterPrimitives};
