//! Simulated 8-bit GPIO output port

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use agon_hal::{HalError, HalResult, Level, OutputPort};

/// One recorded port access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOp {
    Configure(u8),
    Set(u8, Level),
    Modify { set: u8, clear: u8 },
}

/// In-memory output port that records every access
pub struct SimPort {
    data: AtomicU8,
    outputs: AtomicU8,
    log: Mutex<Vec<PortOp>>,
}

impl SimPort {
    pub const fn new() -> Self {
        Self {
            data: AtomicU8::new(0),
            outputs: AtomicU8::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Current data register
    pub fn data(&self) -> u8 {
        self.data.load(Ordering::SeqCst)
    }

    /// Pins configured as outputs
    pub fn outputs(&self) -> u8 {
        self.outputs.load(Ordering::SeqCst)
    }

    pub fn level(&self, pin: u8) -> Level {
        Level::from(self.data() & (1 << pin) != 0)
    }

    /// Snapshot of all accesses so far
    pub fn ops(&self) -> Vec<PortOp> {
        self.log.lock().expect("port log poisoned").clone()
    }

    /// Drain the access log
    pub fn take_ops(&self) -> Vec<PortOp> {
        std::mem::take(&mut *self.log.lock().expect("port log poisoned"))
    }

    fn record(&self, op: PortOp) {
        self.log.lock().expect("port log poisoned").push(op);
    }

    fn update(&self, set: u8, clear: u8) {
        let value = self.data.load(Ordering::SeqCst);
        self.data.store((value & !clear) | set, Ordering::SeqCst);
    }
}

impl Default for SimPort {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPort for &SimPort {
    fn configure_output(&mut self, pin: u8) -> HalResult<()> {
        if pin >= 8 {
            return Err(HalError::InvalidPin);
        }
        self.outputs.fetch_or(1 << pin, Ordering::SeqCst);
        self.record(PortOp::Configure(pin));
        Ok(())
    }

    fn set_output(&mut self, pin: u8, level: Level) -> HalResult<()> {
        if pin >= 8 {
            return Err(HalError::InvalidPin);
        }
        match level {
            Level::High => self.update(1 << pin, 0),
            Level::Low => self.update(0, 1 << pin),
        }
        self.record(PortOp::Set(pin, level));
        Ok(())
    }

    fn modify(&mut self, set: u8, clear: u8) {
        self.update(set, clear);
        self.record(PortOp::Modify { set, clear });
    }

    fn output(&mut self) -> u8 {
        self.data()
    }
}
