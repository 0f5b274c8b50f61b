//! Flag-gated double buffer between foreground code and an interrupt handler
//!
//! [`PublishCell`] holds two slots. The consumer (an interrupt handler)
//! reads the *front* slot; the producer (foreground code) rebuilds the
//! *back* slot in place and then raises a dirty flag. The consumer adopts
//! the back slot at a moment of its own choosing, typically a period
//! boundary, by swapping the slot roles and clearing the flag.
//!
//! Publication order is data first, flag last. The producer clears the flag
//! before touching the back slot, so a consumer can never swap in a
//! half-written value, and only the claim step runs with interrupts masked:
//! the rebuild itself runs with interrupts enabled.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use critical_section::CriticalSection;

use crate::{RtError, RtResult};

/// Single-producer, single-consumer "latest complete value" cell
pub struct PublishCell<T> {
    slots: [UnsafeCell<T>; 2],
    front: AtomicU8,
    dirty: AtomicBool,
    publishing: AtomicBool,
}

// Safety: the back slot is only written by the producer holding the
// `publishing` claim while `dirty` is clear, and the front slot is only read
// inside a critical section. The two never alias.
unsafe impl<T: Send> Sync for PublishCell<T> {}

impl<T> PublishCell<T> {
    /// Create a cell whose consumer initially sees `front`
    pub const fn new(front: T, back: T) -> Self {
        Self {
            slots: [UnsafeCell::new(front), UnsafeCell::new(back)],
            front: AtomicU8::new(0),
            dirty: AtomicBool::new(false),
            publishing: AtomicBool::new(false),
        }
    }

    /// Producer side: rebuild the back slot with `build`, then publish it.
    ///
    /// A value published earlier but not yet adopted is withdrawn first and
    /// overwritten. Returns [`RtError::Busy`] if another publish is running.
    pub fn publish<R>(&self, build: impl FnOnce(&mut T) -> R) -> RtResult<R> {
        let back = critical_section::with(|_| {
            if self.publishing.load(Ordering::Relaxed) {
                return None;
            }
            self.publishing.store(true, Ordering::Relaxed);
            self.dirty.store(false, Ordering::Release);
            Some(self.front.load(Ordering::Acquire) ^ 1)
        })
        .ok_or(RtError::Busy)?;

        // Safety: `dirty` is clear and we hold the publishing claim, so the
        // consumer cannot swap this slot to the front until we raise the
        // flag below, and no other producer can write it.
        let slot = unsafe { &mut *self.slots[usize::from(back)].get() };
        let result = build(slot);

        self.dirty.store(true, Ordering::Release);
        self.publishing.store(false, Ordering::Release);
        Ok(result)
    }

    /// Whether a published value is waiting to be adopted
    pub fn is_pending(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Consumer side: swap the published value to the front if there is one.
    pub fn adopt(&self, _cs: CriticalSection<'_>) -> bool {
        if !self.dirty.load(Ordering::Acquire) {
            return false;
        }
        let front = self.front.load(Ordering::Relaxed);
        self.front.store(front ^ 1, Ordering::Release);
        self.dirty.store(false, Ordering::Release);
        true
    }

    /// Consumer side: read the front slot.
    pub fn with_current<R>(&self, _cs: CriticalSection<'_>, f: impl FnOnce(&T) -> R) -> R {
        let front = self.front.load(Ordering::Acquire);
        // Safety: the front slot is never written while it is the front, and
        // the critical section keeps it from being swapped away meanwhile.
        let slot = unsafe { &*self.slots[usize::from(front)].get() };
        f(slot)
    }
}
