//! Simulated interrupt vector table

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use agon_hal::{Handler, Vector, VectorTable};

/// Vector offsets are even and below 0x40
const SLOTS: usize = 0x20;

/// In-memory vector table with a global interrupt enable
pub struct SimVectors {
    handlers: Mutex<[Option<Handler>; SLOTS]>,
    enabled: AtomicBool,
}

impl SimVectors {
    pub const fn new() -> Self {
        Self {
            handlers: Mutex::new([None; SLOTS]),
            enabled: AtomicBool::new(false),
        }
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn handler(&self, vector: Vector) -> Option<Handler> {
        self.handlers.lock().expect("vector table poisoned")[slot(vector)]
    }

    /// Deliver `vector` as if the hardware had raised it.
    ///
    /// The handler runs inside a critical section. Returns `false` without
    /// calling anything if interrupts are disabled or no handler is installed.
    pub fn raise(&self, vector: Vector) -> bool {
        if !self.interrupts_enabled() {
            return false;
        }
        let Some(handler) = self.handler(vector) else {
            return false;
        };
        critical_section::with(|_| handler());
        true
    }
}

impl Default for SimVectors {
    fn default() -> Self {
        Self::new()
    }
}

fn slot(vector: Vector) -> usize {
    usize::from(vector.offset() / 2)
}

impl VectorTable for &SimVectors {
    fn install(&mut self, vector: Vector, handler: Handler) -> Option<Handler> {
        let mut handlers = self.handlers.lock().expect("vector table poisoned");
        log::trace!("install handler at vector {:#04x}", vector.offset());
        handlers[slot(vector)].replace(handler)
    }

    fn enable_interrupts(&mut self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn disable_interrupts(&mut self) {
        self.enabled.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    static HITS: AtomicUsize = AtomicUsize::new(0);

    fn count_hit() {
        HITS.fetch_add(1, Ordering::SeqCst);
    }

    fn other() {}

    #[test]
    fn test_raise_requires_enable_and_handler() {
        let vectors = SimVectors::new();
        let mut table = &vectors;
        assert!(!vectors.raise(Vector::Prt2));

        assert!(table.install(Vector::Prt2, count_hit).is_none());
        assert!(!vectors.raise(Vector::Prt2));

        table.enable_interrupts();
        assert!(vectors.raise(Vector::Prt2));
        assert!(!vectors.raise(Vector::Prt3));
        assert_eq!(HITS.load(Ordering::SeqCst), 1);

        table.disable_interrupts();
        assert!(!vectors.raise(Vector::Prt2));
    }

    #[test]
    fn test_install_returns_previous() {
        let vectors = SimVectors::new();
        let mut table = &vectors;
        table.install(Vector::Prt0, other);
        let previous = table.install(Vector::Prt0, count_hit);
        assert!(previous.is_some());
        assert!(vectors.handler(Vector::Prt0).is_some());
    }
}
