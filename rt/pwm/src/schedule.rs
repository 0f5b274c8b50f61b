//! Event schedule compiler
//!
//! A schedule turns the duty table into one PWM period worth of port
//! updates. Event 0 raises every active channel; each following event
//! lowers the channels whose duty equals its threshold, in ascending
//! threshold order. An event's delay is the wait *after* it runs, so the
//! delays of one traversal always add up to `255 * step` timer ticks.
//!
//! ```text
//! duties {0: 64, 1: 192}
//!
//! event   set    clear  delay
//!   0     0b11   -      64  * step
//!   1     -      0b01   128 * step
//!   2     -      0b10   63  * step   (back to event 0)
//! ```

use heapless::Vec;

use agon_rt_core::DUTY_MAX;

use crate::channel::{ChannelMask, CHANNELS};

/// Event 0 plus one event per distinct threshold
pub const MAX_EVENTS: usize = CHANNELS + 1;

/// One timer-driven port update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event {
    /// Bits to OR into the port
    pub set: u8,
    /// Bits to clear from the port
    pub clear: u8,
    /// Timer ticks until the next event
    pub delay: u16,
}

/// Sorted events for one PWM period
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schedule {
    events: Vec<Event, MAX_EVENTS>,
}

impl Schedule {
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Recompile from the duty table.
    ///
    /// Only channels in `active` take part; their duties are expected to be
    /// in `1..=254`. An empty mask yields an empty schedule.
    pub fn rebuild(&mut self, duties: &[u8; CHANNELS], active: ChannelMask, step: u16) {
        self.events.clear();
        if active.is_empty() {
            return;
        }

        self.push(Event {
            set: active.bits(),
            ..Event::default()
        });

        let mut last = 0u8;
        for threshold in 1..DUTY_MAX {
            let clear = active
                .iter()
                .filter(|&ch| duties[usize::from(ch)] == threshold)
                .fold(0u8, |mask, ch| mask | ChannelMask::single(ch).bits());
            if clear == 0 {
                continue;
            }
            self.patch_last_delay(threshold - last, step);
            self.push(Event {
                clear,
                ..Event::default()
            });
            last = threshold;
        }

        self.patch_last_delay(DUTY_MAX - last, step);
    }

    fn push(&mut self, event: Event) {
        // At most one event per active channel plus event 0
        let _ = self.events.push(event);
    }

    fn patch_last_delay(&mut self, steps: u8, step: u16) {
        if let Some(event) = self.events.last_mut() {
            event.delay = u16::from(steps).saturating_mul(step);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Sum of all delays: timer ticks in one traversal
    pub fn period_ticks(&self) -> u32 {
        self.events.iter().map(|e| u32::from(e.delay)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: u16 = 90;

    fn duties(pairs: &[(u8, u8)]) -> ([u8; CHANNELS], ChannelMask) {
        let mut table = [0u8; CHANNELS];
        let mut mask = ChannelMask::EMPTY;
        for &(ch, duty) in pairs {
            table[usize::from(ch)] = duty;
            mask.insert(ch);
        }
        (table, mask)
    }

    fn compile(pairs: &[(u8, u8)]) -> Schedule {
        let (table, mask) = duties(pairs);
        let mut schedule = Schedule::new();
        schedule.rebuild(&table, mask, STEP);
        schedule
    }

    #[test]
    fn test_two_channel_schedule() {
        let schedule = compile(&[(0, 64), (1, 192)]);
        assert_eq!(
            schedule.events(),
            &[
                Event { set: 0b11, clear: 0, delay: 64 * STEP },
                Event { set: 0, clear: 0b01, delay: 128 * STEP },
                Event { set: 0, clear: 0b10, delay: 63 * STEP },
            ]
        );
        assert_eq!(schedule.period_ticks(), 255 * u32::from(STEP));
    }

    #[test]
    fn test_shared_threshold_is_one_event() {
        let schedule = compile(&[(2, 100), (5, 100), (6, 1)]);
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.events()[0].set, 0b0110_0100);
        assert_eq!(schedule.events()[1], Event { set: 0, clear: 0b0100_0000, delay: 99 * STEP });
        assert_eq!(schedule.events()[2], Event { set: 0, clear: 0b0010_0100, delay: 155 * STEP });
    }

    #[test]
    fn test_period_invariant_over_all_duties() {
        for duty in 1..DUTY_MAX {
            let schedule = compile(&[(3, duty), (4, 255 - duty)]);
            assert_eq!(schedule.period_ticks(), 255 * u32::from(STEP), "duty {}", duty);
            assert!(schedule.events().iter().all(|e| e.delay > 0));
        }
    }

    #[test]
    fn test_all_channels_distinct_fill_capacity() {
        let pairs: [(u8, u8); CHANNELS] = core::array::from_fn(|ch| (ch as u8, 10 + ch as u8 * 30));
        let schedule = compile(&pairs);
        assert_eq!(schedule.len(), MAX_EVENTS);
        assert_eq!(schedule.events()[0].set, 0xFF);
        let cleared = schedule.events()[1..].iter().fold(0, |m, e| m | e.clear);
        assert_eq!(cleared, 0xFF);
        assert_eq!(schedule.period_ticks(), 255 * u32::from(STEP));
    }

    #[test]
    fn test_empty_mask_gives_empty_schedule() {
        let mut schedule = compile(&[(1, 50)]);
        assert!(!schedule.is_empty());
        schedule.rebuild(&[50; CHANNELS], ChannelMask::EMPTY, STEP);
        assert!(schedule.is_empty());
        assert_eq!(schedule.period_ticks(), 0);
    }

    #[test]
    fn test_inactive_channels_are_ignored() {
        let (mut table, mask) = duties(&[(0, 10)]);
        table[1] = 20;
        let mut schedule = Schedule::new();
        schedule.rebuild(&table, mask, STEP);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.events()[0].set, 0b01);
    }
}
