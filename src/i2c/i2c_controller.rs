// Licensed under the Apache-2.0 license

//! High-level I2C controller abstraction.
//!
//! Implements the embedded-hal `I2c` transaction contract on top of any
//! [`I2cMasterPrimitives`] implementation: one start condition per
//! transaction, a repeated start on every change of direction, a stop at the
//! end, and NACK on the final byte of each read run.

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{AckStatus, Direction};
use crate::i2c::traits::I2cMasterPrimitives;
use embedded_hal::i2c::{NoAcknowledgeSource, Operation, SevenBitAddress};

pub struct I2cController<H: I2cMasterPrimitives, L: Logger = NoOpLogger> {
    pub hardware: H,
    pub logger: L,
}

impl<H: I2cMasterPrimitives> I2cController<H, NoOpLogger> {
    pub fn new(hardware: H) -> Self {
        Self {
            hardware,
            logger: NoOpLogger,
        }
    }
}

impl<H, L> I2cController<H, L>
where
    H: I2cMasterPrimitives,
    H::Error: From<NoAcknowledgeSource>,
    L: Logger,
{
    pub fn with_logger(hardware: H, logger: L) -> Self {
        Self { hardware, logger }
    }

    fn address(
        &self,
        addr: SevenBitAddress,
        direction: Direction,
        repeated: bool,
    ) -> Result<(), H::Error> {
        let status = if repeated {
            self.hardware.repeated_start(addr, direction)?
        } else {
            self.hardware.start(addr, direction)?
        };
        match status {
            AckStatus::Ack => Ok(()),
            AckStatus::Nack => Err(NoAcknowledgeSource::Address.into()),
        }
    }

    fn run(&self, addr: SevenBitAddress, operations: &mut [Operation<'_>]) -> Result<(), H::Error> {
        let mut current: Option<Direction> = None;
        let mut remaining = operations;

        while let Some((op, rest)) = core::mem::take(&mut remaining).split_first_mut() {
            let direction = match op {
                Operation::Read(_) => Direction::Read,
                Operation::Write(_) => Direction::Write,
            };
            if current != Some(direction) {
                self.address(addr, direction, current.is_some())?;
                current = Some(direction);
            }

            match op {
                Operation::Write(bytes) => {
                    for &byte in bytes.iter() {
                        if self.hardware.send(byte)? == AckStatus::Nack {
                            return Err(NoAcknowledgeSource::Data.into());
                        }
                    }
                }
                Operation::Read(buffer) => {
                    // The run continues if any later adjacent read still has bytes.
                    let run_continues = rest
                        .iter()
                        .take_while(|next| matches!(next, Operation::Read(_)))
                        .any(|next| matches!(next, Operation::Read(b) if !b.is_empty()));
                    let len = buffer.len();
                    for (i, slot) in buffer.iter_mut().enumerate() {
                        let ack = if !run_continues && i + 1 == len {
                            AckStatus::Nack
                        } else {
                            AckStatus::Ack
                        };
                        *slot = self.hardware.receive(ack)?;
                    }
                }
            }
            remaining = rest;
        }
        Ok(())
    }
}

impl<H: I2cMasterPrimitives, L: Logger> embedded_hal::i2c::ErrorType for I2cController<H, L> {
    type Error = H::Error;
}

impl<H, L> embedded_hal::i2c::I2c for I2cController<H, L>
where
    H: I2cMasterPrimitives,
    H::Error: From<NoAcknowledgeSource>,
    L: Logger,
{
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.transaction(addr, &mut [Operation::Read(buffer)])
    }

    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        self.transaction(addr, &mut [Operation::Write(bytes)])
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transaction(addr, &mut [Operation::Write(bytes), Operation::Read(buffer)])
    }

    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        match self.run(addr, operations) {
            Ok(()) => self.hardware.stop(),
            Err(e) => {
                self.logger
                    .debug(format_args!("i2c 0x{addr:02X}: transaction aborted: {e:?}"));
                // Release the bus and report the first error.
                let _ = self.hardware.stop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::common::{I2cConfigBuilder, PollBudget};
    use crate::i2c::mssp::{Error, MsspI2c};
    use crate::i2c::registers::IDLE_MASK;
    use crate::i2c::sim::{BusEvent, SimulatedMssp};
    use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

    const ACK: BusEvent = BusEvent::Acknowledge(AckStatus::Ack);
    const NACK: BusEvent = BusEvent::Acknowledge(AckStatus::Nack);

    fn driver(sim: &SimulatedMssp) -> MsspI2c<&SimulatedMssp> {
        let config = I2cConfigBuilder::new()
            .poll_budget(PollBudget::Spins(200_000_000))
            .build()
            .unwrap();
        let i2c = MsspI2c::new(sim, config);
        i2c.init_master();
        i2c
    }

    /// Run `body` against a live simulated bus and return the wire log.
    fn on_bus<T>(
        sim: &SimulatedMssp,
        body: impl FnOnce(&mut I2cController<&MsspI2c<&SimulatedMssp>>) -> T,
    ) -> (T, Vec<BusEvent>) {
        let i2c = driver(sim);
        let out = sim.with_running(|| i2c.on_interrupt(), || {
            let mut bus = I2cController::new(&i2c);
            let out = body(&mut bus);
            i2c.wait_until_idle(IDLE_MASK).unwrap();
            out
        });
        (out, sim.take_events())
    }

    #[test]
    fn test_write() {
        let sim = SimulatedMssp::new();
        let (result, events) = on_bus(&sim, |bus| bus.write(0x50, &[0x01, 0x02]));

        assert_eq!(result, Ok(()));
        assert_eq!(
            events,
            vec![
                BusEvent::Start,
                BusEvent::Transmit(0xA0),
                BusEvent::Transmit(0x01),
                BusEvent::Transmit(0x02),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_read_nacks_last_byte() {
        let sim = SimulatedMssp::new();
        sim.script_rx(&[0x11, 0x22, 0x33]);
        let mut buffer = [0u8; 3];
        let (result, events) = on_bus(&sim, |bus| bus.read(0x48, &mut buffer));

        assert_eq!(result, Ok(()));
        assert_eq!(buffer, [0x11, 0x22, 0x33]);
        assert_eq!(
            events,
            vec![
                BusEvent::Start,
                BusEvent::Transmit(0x91),
                BusEvent::Receive(0x11),
                ACK,
                BusEvent::Receive(0x22),
                ACK,
                BusEvent::Receive(0x33),
                NACK,
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_write_read_uses_repeated_start() {
        let sim = SimulatedMssp::new();
        sim.script_rx(&[0xC3]);
        let mut buffer = [0u8; 1];
        let (result, events) = on_bus(&sim, |bus| bus.write_read(0x50, &[0x10], &mut buffer));

        assert_eq!(result, Ok(()));
        assert_eq!(buffer, [0xC3]);
        assert_eq!(
            events,
            vec![
                BusEvent::Start,
                BusEvent::Transmit(0xA0),
                BusEvent::Transmit(0x10),
                BusEvent::RepeatedStart,
                BusEvent::Transmit(0xA1),
                BusEvent::Receive(0xC3),
                NACK,
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_adjacent_operations_are_merged() {
        let sim = SimulatedMssp::new();
        sim.script_rx(&[0xAA, 0xBB]);
        let mut first = [0u8; 1];
        let mut second = [0u8; 1];
        let mut empty = [0u8; 0];
        let (result, events) = on_bus(&sim, |bus| {
            bus.transaction(
                0x50,
                &mut [
                    Operation::Write(&[0x01]),
                    Operation::Write(&[0x02]),
                    Operation::Read(&mut first),
                    Operation::Read(&mut second),
                    Operation::Read(&mut empty),
                ],
            )
        });

        assert_eq!(result, Ok(()));
        assert_eq!((first, second), ([0xAA], [0xBB]));
        assert_eq!(
            events,
            vec![
                BusEvent::Start,
                BusEvent::Transmit(0xA0),
                BusEvent::Transmit(0x01),
                BusEvent::Transmit(0x02),
                BusEvent::RepeatedStart,
                BusEvent::Transmit(0xA1),
                BusEvent::Receive(0xAA),
                ACK,
                BusEvent::Receive(0xBB),
                NACK,
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_address_nack_stops_bus() {
        let sim = SimulatedMssp::new();
        sim.script_acks(&[AckStatus::Nack]);
        let (result, events) = on_bus(&sim, |bus| bus.write(0x50, &[0x01]));

        assert_eq!(
            result,
            Err(Error::NoAcknowledge(NoAcknowledgeSource::Address))
        );
        assert_eq!(
            result.unwrap_err().kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(
            events,
            vec![BusEvent::Start, BusEvent::Transmit(0xA0), BusEvent::Stop]
        );
    }

    #[test]
    fn test_data_nack_aborts_write() {
        let sim = SimulatedMssp::new();
        sim.script_acks(&[AckStatus::Ack, AckStatus::Nack]);
        let (result, events) = on_bus(&sim, |bus| bus.write(0x50, &[0x01, 0x02, 0x03]));

        assert_eq!(result, Err(Error::NoAcknowledge(NoAcknowledgeSource::Data)));
        assert_eq!(
            events,
            vec![
                BusEvent::Start,
                BusEvent::Transmit(0xA0),
                BusEvent::Transmit(0x01),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_empty_transaction_touches_nothing() {
        let sim = SimulatedMssp::new();
        let (result, events) = on_bus(&sim, |bus| bus.transaction(0x50, &mut []));

        assert_eq!(result, Ok(()));
        assert!(events.is_empty());
    }

    #[test]
    fn test_zero_length_write_probes_address() {
        let sim = SimulatedMssp::new();
        let (result, events) = on_bus(&sim, |bus| bus.write(0x3C, &[]));

        assert_eq!(result, Ok(()));
        assert_eq!(
            events,
            vec![BusEvent::Start, BusEvent::Transmit(0x78), BusEvent::Stop]
        );
    }
}
