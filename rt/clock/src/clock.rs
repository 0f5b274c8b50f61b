//! Interrupt-driven millisecond clock

use core::cell::RefCell;
use core::hint;
use core::sync::atomic::{AtomicU32, Ordering};

use agon_hal::{CountdownTimer, Handler, TimerMode, VectorTable};
use agon_rt_core::{ClockConfig, Micros, Millis, RtResult};
use critical_section::{CriticalSection, Mutex};

/// Millisecond count and raw down-counter captured together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub millis: Millis,
    pub counter: u16,
}

/// Millisecond timebase on one countdown timer
pub struct Clock<T> {
    /// Milliseconds since init; wraps at 32 bits
    ticks: AtomicU32,
    timer: Mutex<RefCell<T>>,
    config: ClockConfig,
}

impl<T: CountdownTimer> Clock<T> {
    /// Create a stopped clock
    pub const fn new(timer: T, config: ClockConfig) -> Self {
        Self {
            ticks: AtomicU32::new(0),
            timer: Mutex::new(RefCell::new(timer)),
            config,
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Start the periodic tick interrupt.
    ///
    /// Stops the timer, installs `handler` at the configured vector, enables
    /// interrupts and starts the timer in periodic mode. `handler` must call
    /// [`Clock::on_interrupt`]. Call once at startup; a second call re-arms
    /// the timer but leaves the counter running.
    pub fn init<V: VectorTable>(&self, vectors: &mut V, handler: Handler) -> RtResult<()> {
        let reload = self.config.validate()?;

        critical_section::with(|cs| self.timer.borrow_ref_mut(cs).stop());
        vectors.install(self.config.vector, handler);
        vectors.enable_interrupts();
        critical_section::with(|cs| {
            self.timer
                .borrow_ref_mut(cs)
                .start(reload, self.config.divider, TimerMode::Periodic)
        })?;

        log::debug!(
            "clock started: reload {} at {} Hz timer input",
            reload,
            self.config.timer_hz()
        );
        Ok(())
    }

    /// Interrupt handler body: acknowledge the timer and count one millisecond.
    pub fn on_interrupt(&self) {
        critical_section::with(|cs| {
            if self.timer.borrow_ref_mut(cs).acknowledge() {
                self.tick(cs);
            }
        });
    }

    fn tick(&self, _cs: CriticalSection<'_>) {
        let ticks = self.ticks.load(Ordering::Relaxed);
        self.ticks.store(ticks.wrapping_add(1), Ordering::Release);
    }

    /// Milliseconds since init
    pub fn now_ms(&self) -> Millis {
        Millis::new(self.ticks.load(Ordering::Acquire))
    }

    /// Capture the millisecond count and the down-counter with interrupts masked.
    ///
    /// If the timer has already reloaded but its interrupt has not been
    /// serviced yet, the pending tick is acknowledged and counted here, so the
    /// two halves of the snapshot always belong to the same period.
    pub fn snapshot(&self) -> Snapshot {
        critical_section::with(|cs| {
            let mut timer = self.timer.borrow_ref_mut(cs);
            let mut counter = timer.counter();
            if timer.acknowledge() {
                self.tick(cs);
                counter = timer.counter();
            }
            Snapshot {
                millis: Millis::new(self.ticks.load(Ordering::Relaxed)),
                counter,
            }
        })
    }

    /// Convert a snapshot to microseconds since init
    pub fn to_micros(&self, snapshot: Snapshot) -> Micros {
        let reload = self.config.reload().min(u32::from(u16::MAX)) as u16;
        let elapsed = reload.saturating_sub(snapshot.counter);
        snapshot
            .millis
            .to_micros()
            .wrapping_add(self.config.ticks_to_us(elapsed))
    }

    /// Microseconds since init, resolved to one timer tick
    pub fn now_us(&self) -> Micros {
        self.to_micros(self.snapshot())
    }

    /// Busy-wait for `ms` milliseconds.
    ///
    /// Requires interrupts to be enabled; with the tick interrupt masked this
    /// never returns.
    pub fn delay(&self, ms: u32) {
        let start = self.now_ms();
        while self.now_ms().elapsed_since(start) < ms {
            hint::spin_loop();
        }
    }

    /// Busy-wait for at least `us` microseconds.
    ///
    /// Best effort: polls [`Clock::now_us`], so the resolution is one timer
    /// tick plus the cost of a snapshot. There is no cycle-counted path for
    /// very short waits.
    pub fn delay_us(&self, us: u32) {
        let start = self.now_us();
        while self.now_us().elapsed_since(start) < us {
            hint::spin_loop();
        }
    }

    /// Overwrite the millisecond counter, e.g. to carry time across a warm restart
    pub fn set_millis(&self, ms: Millis) {
        critical_section::with(|_| self.ticks.store(ms.raw(), Ordering::Release));
    }

    /// Whether the tick timer is running
    pub fn is_running(&self) -> bool {
        critical_section::with(|cs| self.timer.borrow_ref_mut(cs).is_running())
    }
}
