// Licensed under the Apache-2.0 license

//! Host-side model of the MSSP peripheral in I2C master mode.
//!
//! The model keeps a register file of atomics and advances one bus action per
//! [`SimulatedMssp::step`]. When an action finishes it raises SSPIF, runs the
//! supplied interrupt callback (if SSPIE, PEIE and GIE are set) and only then
//! drops the in-progress bit, the way an interrupt preempts the main context
//! on the real part.
//!
//! [`SimulatedMssp::with_running`] runs the model on its own thread for the
//! duration of a closure, so blocking driver calls can be exercised directly:
//!
//! ```rust,ignore
//! let sim = SimulatedMssp::new();
//! let i2c = MsspI2c::new(&sim, config);
//! i2c.init_master();
//! sim.with_running(|| i2c.on_interrupt(), || {
//!     assert_eq!(i2c.start(0x50, Direction::Write), Ok(AckStatus::Ack));
//! });
//! ```

use crate::i2c::common::AckStatus;
use crate::i2c::registers::{
    intcon, pie1, pie2, pir1, pir2, sspcon2, sspstat, MsspRegisters, Register,
};
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use heapless::Deque;
use std::sync::{Mutex, PoisonError};
use std::vec::Vec;

/// Capacity of the scripted acknowledge and receive queues.
pub const SCRIPT_DEPTH: usize = 64;

/// Value shifted in when the receive script is empty (an idle, pulled-up bus).
pub const IDLE_BUS_BYTE: u8 = 0xFF;

/// Something the peripheral did on the wire, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    RepeatedStart,
    Stop,
    /// Byte loaded into SSPBUF for transmission.
    Transmit(u8),
    /// Byte clocked in from the target.
    Receive(u8),
    /// Acknowledge sequence driven by the master after a received byte.
    Acknowledge(AckStatus),
}

#[derive(Default)]
struct RegisterFile {
    sspcon1: AtomicU8,
    sspcon2: AtomicU8,
    sspstat: AtomicU8,
    sspadd: AtomicU8,
    sspbuf: AtomicU8,
    pir1: AtomicU8,
    pie1: AtomicU8,
    pir2: AtomicU8,
    pie2: AtomicU8,
    intcon: AtomicU8,
}

impl RegisterFile {
    fn cell(&self, reg: Register) -> &AtomicU8 {
        match reg {
            Register::Sspcon1 => &self.sspcon1,
            Register::Sspcon2 => &self.sspcon2,
            Register::Sspstat => &self.sspstat,
            Register::Sspadd => &self.sspadd,
            Register::Sspbuf => &self.sspbuf,
            Register::Pir1 => &self.pir1,
            Register::Pie1 => &self.pie1,
            Register::Pir2 => &self.pir2,
            Register::Pie2 => &self.pie2,
            Register::Intcon => &self.intcon,
        }
    }
}

#[derive(Default)]
pub struct SimulatedMssp {
    regs: RegisterFile,
    running: AtomicBool,
    acks: Mutex<Deque<AckStatus, SCRIPT_DEPTH>>,
    rx: Mutex<Deque<u8, SCRIPT_DEPTH>>,
    events: Mutex<Vec<BusEvent>>,
}

impl SimulatedMssp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the acknowledge each following transmitted byte (address or
    /// data) will see. Unscripted bytes are acknowledged.
    pub fn script_acks(&self, acks: &[AckStatus]) {
        let mut queue = self.acks.lock().unwrap_or_else(PoisonError::into_inner);
        for &ack in acks {
            assert!(queue.push_back(ack).is_ok(), "ack script full");
        }
    }

    /// Queue bytes the target will return on the following receives.
    pub fn script_rx(&self, bytes: &[u8]) {
        let mut queue = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        for &byte in bytes {
            assert!(queue.push_back(byte).is_ok(), "receive script full");
        }
    }

    #[must_use]
    pub fn events(&self) -> Vec<BusEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take_events(&self) -> Vec<BusEvent> {
        core::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Raw register value, without the read side effects of SSPBUF.
    #[must_use]
    pub fn peek(&self, reg: Register) -> u8 {
        self.regs.cell(reg).load(Ordering::SeqCst)
    }

    /// Force a register value, bypassing the model.
    pub fn poke(&self, reg: Register, value: u8) {
        self.regs.cell(reg).store(value, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> [u8; Register::COUNT] {
        Register::ALL.map(|reg| self.peek(reg))
    }

    /// Advance the peripheral by one poll cycle. Returns `false` when there
    /// was nothing to do.
    pub fn step(&self, isr: &dyn Fn()) -> bool {
        let con2 = self.peek(Register::Sspcon2);
        if con2 & sspcon2::SEN != 0 {
            self.record(BusEvent::Start);
            self.set(Register::Sspstat, sspstat::S);
            self.clear(Register::Sspstat, sspstat::P);
            self.complete(isr, sspcon2::SEN);
        } else if con2 & sspcon2::RSEN != 0 {
            self.record(BusEvent::RepeatedStart);
            self.complete(isr, sspcon2::RSEN);
        } else if con2 & sspcon2::PEN != 0 {
            self.record(BusEvent::Stop);
            self.clear(Register::Sspstat, sspstat::S);
            self.set(Register::Sspstat, sspstat::P);
            self.complete(isr, sspcon2::PEN);
        } else if con2 & sspcon2::RCEN != 0 {
            let byte = self
                .rx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or(IDLE_BUS_BYTE);
            self.poke(Register::Sspbuf, byte);
            self.set(Register::Sspstat, sspstat::BF);
            self.record(BusEvent::Receive(byte));
            self.complete(isr, sspcon2::RCEN);
        } else if con2 & sspcon2::ACKEN != 0 {
            self.record(BusEvent::Acknowledge(AckStatus::from_bit(
                con2 & sspcon2::ACKDT != 0,
            )));
            self.complete(isr, sspcon2::ACKEN);
        } else if self.peek(Register::Sspstat) & sspstat::R_W != 0 {
            let ack = self
                .acks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or(AckStatus::Ack);
            match ack {
                AckStatus::Ack => self.clear(Register::Sspcon2, sspcon2::ACKSTAT),
                AckStatus::Nack => self.set(Register::Sspcon2, sspcon2::ACKSTAT),
            }
            self.clear(Register::Sspstat, sspstat::R_W | sspstat::BF);
            self.complete(isr, 0);
        } else {
            return false;
        }
        true
    }

    /// Flag a bus collision and run the interrupt if BCLIE is enabled.
    pub fn raise_collision(&self, isr: &dyn Fn()) {
        self.set(Register::Pir2, pir2::BCLIF);
        if self.peek(Register::Pie2) & pie2::BCLIE != 0 && self.interrupts_enabled() {
            isr();
        }
    }

    /// Run the model on a hardware thread while `body` executes on the
    /// calling thread. The hardware thread is stopped even if `body` panics.
    pub fn with_running<T>(&self, isr: impl Fn() + Sync, body: impl FnOnce() -> T) -> T {
        struct Halt<'a>(&'a AtomicBool);

        impl Drop for Halt<'_> {
            fn drop(&mut self) {
                self.0.store(false, Ordering::SeqCst);
            }
        }

        self.running.store(true, Ordering::SeqCst);
        std::thread::scope(|s| {
            let _halt = Halt(&self.running);
            s.spawn(|| {
                while self.running.load(Ordering::SeqCst) {
                    if !self.step(&isr) {
                        std::thread::yield_now();
                    }
                }
            });
            body()
        })
    }

    fn interrupts_enabled(&self) -> bool {
        let gates = intcon::GIE | intcon::PEIE;
        self.peek(Register::Intcon) & gates == gates
    }

    fn complete(&self, isr: &dyn Fn(), busy_bit: u8) {
        self.set(Register::Pir1, pir1::SSPIF);
        if self.peek(Register::Pie1) & pie1::SSPIE != 0 && self.interrupts_enabled() {
            isr();
        }
        self.clear(Register::Sspcon2, busy_bit);
    }

    fn record(&self, event: BusEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn set(&self, reg: Register, mask: u8) {
        self.regs.cell(reg).fetch_or(mask, Ordering::SeqCst);
    }

    fn clear(&self, reg: Register, mask: u8) {
        self.regs.cell(reg).fetch_and(!mask, Ordering::SeqCst);
    }
}

impl MsspRegisters for SimulatedMssp {
    fn read(&self, reg: Register) -> u8 {
        let value = self.peek(reg);
        if reg == Register::Sspbuf {
            self.clear(Register::Sspstat, sspstat::BF);
        }
        value
    }

    fn write(&self, reg: Register, value: u8) {
        self.poke(reg, value);
        if reg == Register::Sspbuf {
            self.record(BusEvent::Transmit(value));
            self.set(Register::Sspstat, sspstat::R_W | sspstat::BF);
        }
    }

    fn set_bits(&self, reg: Register, mask: u8) {
        self.set(reg, mask);
    }

    fn clear_bits(&self, reg: Register, mask: u8) {
        self.clear(reg, mask);
    }
}
