//! Simulated programmable reload timer

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};
use std::sync::Mutex;

use agon_hal::{ClockDivider, CountdownTimer, HalError, HalResult, TimerMode};

const MODE_ONE_SHOT: u8 = 0;
const MODE_PERIODIC: u8 = 1;

/// In-memory countdown timer
///
/// Nothing counts on its own: tests move the counter with
/// [`SimTimer::set_counter`] and end a count with [`SimTimer::expire`].
pub struct SimTimer {
    running: AtomicBool,
    pending: AtomicBool,
    reload: AtomicU16,
    counter: AtomicU16,
    mode: AtomicU8,
    divider: AtomicU32,
    starts: AtomicU32,
    rearms: Mutex<Vec<u16>>,
}

impl SimTimer {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            reload: AtomicU16::new(0),
            counter: AtomicU16::new(0),
            mode: AtomicU8::new(MODE_ONE_SHOT),
            divider: AtomicU32::new(0),
            starts: AtomicU32::new(0),
            rearms: Mutex::new(Vec::new()),
        }
    }

    /// End the current count: raise the pending flag and reload the counter
    ///
    /// Runs in a critical section so foreground snapshots never see the flag
    /// without the reloaded counter.
    pub fn expire(&self) {
        critical_section::with(|_| {
            self.pending.store(true, Ordering::SeqCst);
            self.counter
                .store(self.reload.load(Ordering::SeqCst), Ordering::SeqCst);
        });
    }

    /// Force the instantaneous counter value
    pub fn set_counter(&self, value: u16) {
        self.counter.store(value, Ordering::SeqCst);
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Last reload value written
    pub fn reload(&self) -> u16 {
        self.reload.load(Ordering::SeqCst)
    }

    pub fn mode(&self) -> TimerMode {
        match self.mode.load(Ordering::SeqCst) {
            MODE_PERIODIC => TimerMode::Periodic,
            _ => TimerMode::OneShot,
        }
    }

    /// Prescaler divisor selected by the last start, 0 if never started
    pub fn divisor(&self) -> u32 {
        self.divider.load(Ordering::SeqCst)
    }

    /// Number of times the timer was started
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Drain the reload values passed to `rearm` so far
    pub fn take_rearms(&self) -> Vec<u16> {
        std::mem::take(&mut *self.rearms.lock().expect("rearm log poisoned"))
    }
}

impl Default for SimTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer for &SimTimer {
    fn start(&mut self, reload: u16, divider: ClockDivider, mode: TimerMode) -> HalResult<()> {
        if reload == 0 {
            return Err(HalError::ZeroReload);
        }
        let mode = match mode {
            TimerMode::OneShot => MODE_ONE_SHOT,
            TimerMode::Periodic => MODE_PERIODIC,
        };
        self.reload.store(reload, Ordering::SeqCst);
        self.counter.store(reload, Ordering::SeqCst);
        self.mode.store(mode, Ordering::SeqCst);
        self.divider.store(divider.divisor(), Ordering::SeqCst);
        self.pending.store(false, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn rearm(&mut self, reload: u16) -> HalResult<()> {
        if reload == 0 {
            return Err(HalError::ZeroReload);
        }
        if self.divider.load(Ordering::SeqCst) == 0 {
            return Err(HalError::NotStarted);
        }
        self.reload.store(reload, Ordering::SeqCst);
        self.counter.store(reload, Ordering::SeqCst);
        self.rearms
            .lock()
            .expect("rearm log poisoned")
            .push(reload);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&mut self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn counter(&mut self) -> u16 {
        self.counter.load(Ordering::SeqCst)
    }

    fn acknowledge(&mut self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}
