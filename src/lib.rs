// Licensed under the Apache-2.0 license

//! Master-mode I2C driver for the PIC18 MSSP (Master Synchronous Serial Port)
//! peripheral.
//!
//! The [`i2c::mssp::MsspI2c`] driver exposes the raw bus primitives (start,
//! repeated start, stop, byte send and receive) plus the interrupt handler that
//! releases them. [`i2c::i2c_controller::I2cController`] layers the
//! `embedded_hal::i2c::I2c` transaction API on top.
//!
//! ```rust,ignore
//! use mssp_i2c::i2c::{Direction, I2cConfig, I2cConfigBuilder, I2cSpeed, MsspI2c, Pic18Mmio, RegisterMap};
//!
//! const CONFIG: I2cConfig = match I2cConfigBuilder::new().speed(I2cSpeed::Fast).build() {
//!     Ok(config) => config,
//!     Err(_) => panic!("bus speed not reachable from core clock"),
//! };
//!
//! static I2C: MsspI2c<Pic18Mmio> =
//!     MsspI2c::new(unsafe { Pic18Mmio::new(RegisterMap::PIC18F4550) }, CONFIG);
//!
//! // From the interrupt vector:
//! I2C.on_interrupt();
//!
//! // From the main context:
//! I2C.init_master();
//! I2C.start(0x50, Direction::Write)?;
//! I2C.send(0xAB)?;
//! I2C.stop()?;
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::indexing_slicing))]
#![cfg_attr(not(test), warn(clippy::expect_used))]
#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod common;
pub mod i2c;
