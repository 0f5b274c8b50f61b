//! Background thread standing in for a free-running hardware timer
//!
//! While the bound [`SimTimer`] is running, the thread ends its count and
//! raises the bound vector once per period. The thread stops when the
//! [`Ticker`] is dropped.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::panic;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use agon_hal::Vector;

use crate::timer::SimTimer;
use crate::vectors::SimVectors;

/// Handle to a running ticker thread
pub struct Ticker {
    running: Arc<AtomicBool>,
    fired: Arc<AtomicU32>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start raising `vector` every `period` while `timer` runs
    pub fn spawn(
        vectors: &'static SimVectors,
        timer: &'static SimTimer,
        vector: Vector,
        period: Duration,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let fired = Arc::new(AtomicU32::new(0));

        let thread = {
            let running = Arc::clone(&running);
            let fired = Arc::clone(&fired);
            thread::spawn(move || {
                while running.load(Ordering::Relaxed) {
                    if timer.running() {
                        timer.expire();
                        if vectors.raise(vector) {
                            fired.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    if period.is_zero() {
                        thread::yield_now();
                    } else {
                        thread::sleep(period);
                    }
                }
            })
        };

        Self {
            running,
            fired,
            thread: Some(thread),
        }
    }

    /// Interrupts delivered so far
    pub fn fired(&self) -> u32 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Block until at least `count` interrupts have been delivered
    pub fn wait_for(&self, count: u32) {
        while self.fired() < count {
            thread::yield_now();
        }
    }

    /// Stop the thread and wait for it to finish
    ///
    /// A panic raised by an interrupt handler on the ticker thread is
    /// re-raised here.
    pub fn stop(mut self) -> u32 {
        self.shutdown();
        self.fired()
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            if let Err(payload) = handle.join() {
                if !thread::panicking() {
                    panic::resume_unwind(payload);
                }
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
