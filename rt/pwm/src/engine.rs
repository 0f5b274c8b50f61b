//! Software PWM engine
//!
//! One countdown timer walks the committed [`Schedule`], one event per
//! interrupt. Foreground calls rebuild the schedule into the back slot of a
//! [`PublishCell`]; the interrupt handler adopts it when its cursor wraps,
//! so a new schedule only ever takes effect on a period boundary.

use core::cell::RefCell;
use core::hint;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use agon_hal::{CountdownTimer, Handler, Level, OutputPort, Pin, Port, TimerMode, VectorTable};
use agon_rt_core::{PublishCell, PwmConfig, RtError, RtResult, DUTY_MAX};
use critical_section::{CriticalSection, Mutex};

use crate::channel::{ChannelMask, ChannelState, CHANNELS};
use crate::schedule::Schedule;

struct Hardware<P, T> {
    port: P,
    timer: T,
}

/// Foreground view of the channels
struct Channels {
    duty: [u8; CHANNELS],
    active: ChannelMask,
}

impl Channels {
    const fn new() -> Self {
        Self {
            duty: [0; CHANNELS],
            active: ChannelMask::EMPTY,
        }
    }
}

/// Eight-channel software PWM on one output port and one countdown timer
///
/// Meant to live in a `static`; the interrupt vector of the timer must be
/// routed to a `fn()` calling [`Pwm::on_interrupt`].
pub struct Pwm<P, T> {
    hw: Mutex<RefCell<Hardware<P, T>>>,
    channels: Mutex<RefCell<Channels>>,
    schedule: PublishCell<Schedule>,
    /// Index of the next event to run
    cursor: AtomicU8,
    running: AtomicBool,
    config: PwmConfig,
}

impl<P: OutputPort, T: CountdownTimer> Pwm<P, T> {
    pub const fn new(port: P, timer: T, config: PwmConfig) -> Self {
        Self {
            hw: Mutex::new(RefCell::new(Hardware { port, timer })),
            channels: Mutex::new(RefCell::new(Channels::new())),
            schedule: PublishCell::new(Schedule::new(), Schedule::new()),
            cursor: AtomicU8::new(0),
            running: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &PwmConfig {
        &self.config
    }

    /// Stop the timer, forget all channels and install the interrupt handler.
    ///
    /// `handler` must call [`Pwm::on_interrupt`]. Interrupts are enabled on
    /// return.
    pub fn init<V: VectorTable>(&self, vectors: &mut V, handler: Handler) -> RtResult<()> {
        let step = self.config.validate()?;

        critical_section::with(|cs| {
            self.halt(cs);
            *self.channels.borrow_ref_mut(cs) = Channels::new();
        });
        self.schedule.publish(Schedule::clear)?;
        critical_section::with(|cs| self.schedule.adopt(cs));

        vectors.install(self.config.vector, handler);
        vectors.enable_interrupts();

        log::debug!(
            "pwm ready: {} ticks per step, {} Hz",
            step,
            self.config.frequency_hz
        );
        Ok(())
    }

    /// Set the duty of `channel` (0 = low, 255 = high, anything else modulates).
    ///
    /// Channels past the last one are ignored. Moving a modulating channel to
    /// a static level waits, while the timer runs, until the interrupt
    /// handler has committed a schedule without that channel; the pin is only
    /// forced afterwards. That wait needs interrupts enabled and gives up
    /// with [`RtError::CommitTimeout`] after `commit_spin_limit` polls,
    /// leaving the pin alone.
    pub fn set_duty(&self, channel: u8, duty: u8) -> RtResult<()> {
        if usize::from(channel) >= CHANNELS {
            log::trace!("ignoring duty for channel {}", channel);
            return Ok(());
        }
        let step = self.config.validate()?;

        match ChannelState::from_duty(duty) {
            ChannelState::Modulating(duty) => self.modulate(channel, duty, step),
            ChannelState::Off => self.hold(channel, 0, Level::Low, step),
            ChannelState::On => self.hold(channel, DUTY_MAX, Level::High, step),
        }
    }

    fn modulate(&self, channel: u8, duty: u8, step: u16) -> RtResult<()> {
        let (duties, active) = critical_section::with(|cs| -> RtResult<_> {
            let mut channels = self.channels.borrow_ref_mut(cs);
            if !channels.active.contains(channel) {
                self.hw.borrow_ref_mut(cs).port.configure_output(channel)?;
                channels.active.insert(channel);
            }
            channels.duty[usize::from(channel)] = duty;
            Ok((channels.duty, channels.active))
        })?;

        self.rebuild(&duties, active, step)?;
        if !self.running.load(Ordering::Acquire) {
            self.start()?;
        }
        Ok(())
    }

    fn hold(&self, channel: u8, duty: u8, level: Level, step: u16) -> RtResult<()> {
        let (duties, active) = critical_section::with(|cs| {
            let mut channels = self.channels.borrow_ref_mut(cs);
            channels.active.remove(channel);
            channels.duty[usize::from(channel)] = duty;
            (channels.duty, channels.active)
        });

        self.rebuild(&duties, active, step)?;
        if self.running.load(Ordering::Acquire) {
            self.wait_for_commit()?;
        }
        if active.is_empty() {
            self.stop();
        }

        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            hw.port.configure_output(channel)?;
            hw.port.set_output(channel, level)
        })?;
        Ok(())
    }

    /// Take `channel` out of PWM control without driving it.
    ///
    /// The pin keeps whatever level the last executed event left it at. The
    /// timer stops once no channel remains.
    pub fn disable(&self, channel: u8) -> RtResult<()> {
        if usize::from(channel) >= CHANNELS {
            return Ok(());
        }
        let step = self.config.validate()?;

        let (duties, active) = critical_section::with(|cs| {
            let mut channels = self.channels.borrow_ref_mut(cs);
            channels.active.remove(channel);
            (channels.duty, channels.active)
        });

        self.rebuild(&duties, active, step)?;
        if active.is_empty() {
            self.stop();
        }
        Ok(())
    }

    /// Board-level analog output: port C pins map to the channel of the same
    /// index, every other pin is ignored. `value` is clamped to `0..=255`.
    pub fn analog_write(&self, pin: Pin, value: i32) -> RtResult<()> {
        if pin.port() != Some(Port::C) {
            log::trace!("pin {} has no pwm channel", pin.raw());
            return Ok(());
        }
        let duty = value.clamp(0, i32::from(DUTY_MAX)) as u8;
        self.set_duty(pin.index(), duty)
    }

    fn rebuild(&self, duties: &[u8; CHANNELS], active: ChannelMask, step: u16) -> RtResult<()> {
        let events = self.schedule.publish(|schedule| {
            schedule.rebuild(duties, active, step);
            schedule.len()
        })?;
        log::trace!("schedule rebuilt: {} events, active {}", events, active);
        Ok(())
    }

    fn wait_for_commit(&self) -> RtResult<()> {
        for _ in 0..self.config.commit_spin_limit {
            if !self.schedule.is_pending() {
                return Ok(());
            }
            hint::spin_loop();
        }
        if !self.schedule.is_pending() {
            return Ok(());
        }
        log::warn!(
            "schedule not committed after {} polls",
            self.config.commit_spin_limit
        );
        Err(RtError::CommitTimeout)
    }

    /// Start the timer on the latest schedule.
    ///
    /// The port is set to event 0's state directly, so the timer is armed
    /// with event 0's delay and the cursor starts at event 1.
    fn start(&self) -> RtResult<()> {
        critical_section::with(|cs| {
            if self.running.load(Ordering::Relaxed) {
                return Ok(());
            }
            self.schedule.adopt(cs);
            let Some(first) = self.schedule.with_current(cs, |s| s.get(0).copied()) else {
                return Ok(());
            };
            let len = self.schedule.with_current(cs, Schedule::len);

            let mut hw = self.hw.borrow_ref_mut(cs);
            hw.port.modify(first.set, first.clear);
            self.cursor
                .store(if len > 1 { 1 } else { 0 }, Ordering::Relaxed);
            hw.timer
                .start(first.delay, self.config.divider, TimerMode::OneShot)?;
            self.running.store(true, Ordering::Release);

            log::debug!("pwm timer started, {} events", len);
            Ok(())
        })
    }

    fn stop(&self) {
        critical_section::with(|cs| self.halt(cs));
        log::debug!("pwm timer stopped");
    }

    fn halt(&self, cs: CriticalSection<'_>) {
        self.hw.borrow_ref_mut(cs).timer.stop();
        self.running.store(false, Ordering::Release);
        self.cursor.store(0, Ordering::Relaxed);
    }

    /// Interrupt handler body
    ///
    /// Runs the event under the cursor, advances the cursor, adopts a
    /// pending schedule when the cursor wraps and re-arms the timer with the
    /// delay of the event it just ran.
    pub fn on_interrupt(&self) {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_ref_mut(cs);
            let hw = &mut *hw;
            // A stop can race an interrupt that was already pending
            if !hw.timer.acknowledge() || !self.running.load(Ordering::Relaxed) {
                return;
            }

            let len = self.schedule.with_current(cs, Schedule::len);
            if len == 0 {
                // Nothing to run. A pending schedule starts after one idle
                // period, otherwise the one-shot timer stays stopped.
                self.cursor.store(0, Ordering::Relaxed);
                if self.schedule.adopt(cs) {
                    let idle = u16::try_from(self.config.period_ticks()).unwrap_or(u16::MAX);
                    self.rearm(hw, idle);
                } else {
                    hw.timer.stop();
                    self.running.store(false, Ordering::Release);
                }
                return;
            }

            let mut cursor = usize::from(self.cursor.load(Ordering::Relaxed));
            if cursor >= len {
                cursor = 0;
            }
            let event = self.schedule.with_current(cs, |s| s.events()[cursor]);
            hw.port.modify(event.set, event.clear);

            let mut next = cursor + 1;
            if next >= len {
                next = 0;
                self.schedule.adopt(cs);
            }
            self.cursor.store(next as u8, Ordering::Relaxed);
            self.rearm(hw, event.delay);
        });
    }

    fn rearm(&self, hw: &mut Hardware<P, T>, delay: u16) {
        if hw.timer.rearm(delay).is_err() {
            self.running.store(false, Ordering::Release);
        }
    }

    /// Last duty written to `channel`
    pub fn duty(&self, channel: u8) -> Option<u8> {
        let index = usize::from(channel);
        if index >= CHANNELS {
            return None;
        }
        Some(critical_section::with(|cs| {
            self.channels.borrow_ref(cs).duty[index]
        }))
    }

    /// Channels currently modulated
    pub fn active_mask(&self) -> ChannelMask {
        critical_section::with(|cs| self.channels.borrow_ref(cs).active)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether a rebuilt schedule is still waiting for the interrupt handler
    pub fn is_commit_pending(&self) -> bool {
        self.schedule.is_pending()
    }

    /// Copy of the schedule the interrupt handler is running
    pub fn active_schedule(&self) -> Schedule {
        critical_section::with(|cs| self.schedule.with_current(cs, Schedule::clone))
    }
}
