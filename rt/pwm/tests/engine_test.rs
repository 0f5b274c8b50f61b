//! Software PWM engine tests on the host simulation
//!
//! Each test owns its own port, timer, vector table and engine statics.
//! Interrupts are either raised by hand (`tick`) to step through a schedule
//! event by event, or by a [`Ticker`] thread when a foreground call has to
//! wait for the interrupt handler.

use std::time::Duration;

use agon_hal::{Level, Pin, Port, TimerMode, Vector};
use agon_posix::{PortOp, SimPort, SimTimer, SimVectors, Ticker};
use agon_pwm::{ChannelMask, Event, Pwm};
use agon_rt_core::{PwmConfig, RtError};

type SimPwm = Pwm<&'static SimPort, &'static SimTimer>;

const STEP: u16 = 90;

/// Run one scheduled event: end the timer count and raise its vector
fn tick(timer: &SimTimer, vectors: &SimVectors) {
    timer.expire();
    assert!(vectors.raise(Vector::Prt1));
}

mod scenario {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(&PORT, &TIMER, PwmConfig::DEFAULT);

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_two_channels_follow_sorted_events() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PWM.set_duty(0, 64).unwrap();
        PWM.set_duty(1, 192).unwrap();
        assert_eq!(PWM.active_mask(), ChannelMask::from_bits(0b11));

        // Channel 1 joins at the end of the running period
        assert!(PWM.is_commit_pending());
        assert_eq!(PWM.active_schedule().len(), 2);
        tick(&TIMER, &VECTORS);
        assert!(!PWM.is_commit_pending());
        assert_eq!(
            PWM.active_schedule().events(),
            &[
                Event { set: 0b11, clear: 0, delay: 64 * STEP },
                Event { set: 0, clear: 0b01, delay: 128 * STEP },
                Event { set: 0, clear: 0b10, delay: 63 * STEP },
            ]
        );
        assert_eq!(PORT.data() & 0b11, 0b00);

        tick(&TIMER, &VECTORS);
        assert_eq!(PORT.data() & 0b11, 0b11);
        tick(&TIMER, &VECTORS);
        assert_eq!(PORT.data() & 0b11, 0b10);
        tick(&TIMER, &VECTORS);
        assert_eq!(PORT.data() & 0b11, 0b00);

        assert_eq!(
            TIMER.take_rearms(),
            vec![191 * STEP, 64 * STEP, 128 * STEP, 63 * STEP]
        );
        assert_eq!(PWM.active_schedule().period_ticks(), 255 * u32::from(STEP));
    }
}

mod start {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(&PORT, &TIMER, PwmConfig::DEFAULT);

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_first_channel_primes_port_and_timer() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        assert!(!PWM.is_running());
        assert!(VECTORS.interrupts_enabled());
        assert!(VECTORS.handler(Vector::Prt1).is_some());

        PWM.set_duty(1, 10).unwrap();
        assert!(PWM.is_running());
        assert_eq!(PORT.level(1), Level::High);
        assert_eq!(PORT.outputs(), 0b10);
        assert_eq!(TIMER.reload(), 10 * STEP);
        assert_eq!(TIMER.mode(), TimerMode::OneShot);
        assert_eq!(TIMER.divisor(), 16);
        assert!(!PWM.is_commit_pending());

        // Event 0 already happened; the first interrupt runs event 1
        tick(&TIMER, &VECTORS);
        assert_eq!(PORT.level(1), Level::Low);
        assert_eq!(TIMER.take_rearms(), vec![245 * STEP]);

        tick(&TIMER, &VECTORS);
        assert_eq!(PORT.level(1), Level::High);
        assert_eq!(TIMER.take_rearms(), vec![10 * STEP]);
    }
}

mod idempotence {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(&PORT, &TIMER, PwmConfig::DEFAULT);

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_repeated_duty_gives_same_schedule() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PWM.set_duty(2, 100).unwrap();
        PWM.set_duty(6, 30).unwrap();
        while PWM.is_commit_pending() {
            tick(&TIMER, &VECTORS);
        }
        let once = PWM.active_schedule();

        PWM.set_duty(6, 30).unwrap();
        while PWM.is_commit_pending() {
            tick(&TIMER, &VECTORS);
        }
        assert_eq!(PWM.active_schedule(), once);
        assert_eq!(once.len(), 3);
        assert_eq!(once.period_ticks(), 255 * u32::from(STEP));
        assert_eq!(PWM.duty(6), Some(30));
    }
}

mod all_off {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(
        &PORT,
        &TIMER,
        PwmConfig::DEFAULT.with_commit_spin_limit(u32::MAX),
    );

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_last_channel_off_stops_timer() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PWM.set_duty(3, 128).unwrap();
        PWM.set_duty(5, 200).unwrap();
        let ticker = Ticker::spawn(&VECTORS, &TIMER, Vector::Prt1, Duration::from_micros(20));

        PWM.set_duty(3, 0).unwrap();
        assert!(PWM.is_running());
        assert_eq!(PORT.level(3), Level::Low);

        PWM.set_duty(5, 0).unwrap();
        assert!(!PWM.is_running());
        assert!(!TIMER.running());
        assert!(PWM.active_schedule().is_empty());
        assert!(PWM.active_mask().is_empty());
        assert_eq!(PORT.level(5), Level::Low);
        drop(ticker);

        // Everything off again from idle needs no interrupt at all
        PWM.set_duty(3, 0).unwrap();
        assert_eq!(PORT.level(3), Level::Low);
        assert!(!PWM.is_running());
    }
}

mod commit_order {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(
        &PORT,
        &TIMER,
        PwmConfig::DEFAULT.with_commit_spin_limit(u32::MAX),
    );

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_static_level_is_forced_after_commit() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PWM.set_duty(5, 128).unwrap();
        PWM.set_duty(2, 50).unwrap();
        PORT.take_ops();

        let ticker = Ticker::spawn(&VECTORS, &TIMER, Vector::Prt1, Duration::from_micros(20));
        PWM.set_duty(5, 0).unwrap();
        assert!(!PWM.is_commit_pending());
        assert!(PWM.is_running());

        let schedule = PWM.active_schedule();
        assert!(schedule.events().iter().all(|e| (e.set | e.clear) & 0b10_0000 == 0));

        // The forced level comes after the commit; no later event touches pin 5
        let ops = PORT.ops();
        let forced = ops
            .iter()
            .position(|op| *op == PortOp::Set(5, Level::Low))
            .unwrap();
        assert!(ops[forced..].iter().all(|op| match op {
            PortOp::Modify { set, .. } => set & 0b10_0000 == 0,
            _ => true,
        }));

        PWM.set_duty(2, 255).unwrap();
        assert!(!PWM.is_running());
        assert_eq!(PORT.level(2), Level::High);
        assert_eq!(PORT.level(5), Level::Low);
        drop(ticker);
    }
}

mod commit_timeout {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(
        &PORT,
        &TIMER,
        PwmConfig::DEFAULT.with_commit_spin_limit(1_000),
    );

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_pin_left_alone_when_commit_times_out() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PWM.set_duty(4, 128).unwrap();
        assert_eq!(PORT.level(4), Level::High);

        // No interrupts are delivered, so nothing ever commits
        assert_eq!(PWM.set_duty(4, 0), Err(RtError::CommitTimeout));
        assert!(PWM.is_commit_pending());
        assert_eq!(PORT.level(4), Level::High);
        assert!(!PORT.ops().contains(&PortOp::Set(4, Level::Low)));
        assert!(!PWM.active_mask().contains(4));

        // Period end lowers the pin and commits the empty schedule
        tick(&TIMER, &VECTORS);
        assert!(!PWM.is_commit_pending());
        assert_eq!(PORT.level(4), Level::Low);

        // With nothing to run the handler stops the timer
        tick(&TIMER, &VECTORS);
        assert!(!PWM.is_running());
        assert!(!TIMER.running());

        PWM.set_duty(4, 0).unwrap();
        assert_eq!(PORT.ops().last(), Some(&PortOp::Set(4, Level::Low)));
    }
}

mod pending_after_idle {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(
        &PORT,
        &TIMER,
        PwmConfig::DEFAULT.with_commit_spin_limit(1_000),
    );

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_schedule_published_while_idle_starts_after_one_period() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PWM.set_duty(4, 128).unwrap();
        assert_eq!(PWM.set_duty(4, 0), Err(RtError::CommitTimeout));

        // Period end commits the empty schedule but the timer keeps going
        tick(&TIMER, &VECTORS);
        assert!(!PWM.is_commit_pending());
        assert_eq!(PORT.level(4), Level::Low);
        assert!(PWM.active_schedule().is_empty());
        assert!(PWM.is_running());

        // Already running, so this only publishes
        PWM.set_duty(4, 100).unwrap();
        assert!(PWM.is_commit_pending());
        assert!(PWM.is_running());
        TIMER.take_rearms();
        let idle_port = PORT.data();

        // Idle interrupt adopts the new schedule and waits out one period
        tick(&TIMER, &VECTORS);
        assert_eq!(TIMER.take_rearms(), vec![255 * STEP]);
        assert_eq!(PORT.data(), idle_port);
        assert!(!PWM.is_commit_pending());
        assert_eq!(PWM.active_schedule().len(), 2);

        // Then event 0 of the new schedule runs
        tick(&TIMER, &VECTORS);
        assert_eq!(PORT.level(4), Level::High);
        assert_eq!(TIMER.take_rearms(), vec![100 * STEP]);
        assert!(TIMER.running());
    }
}

mod disable {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(&PORT, &TIMER, PwmConfig::DEFAULT);

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_disable_releases_channels() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PWM.set_duty(0, 50).unwrap();
        PWM.set_duty(1, 100).unwrap();

        PWM.disable(1).unwrap();
        assert_eq!(PWM.active_mask(), ChannelMask::from_bits(0b01));
        assert_eq!(PWM.duty(1), Some(100));
        assert!(PWM.is_running());

        PWM.disable(9).unwrap();
        PWM.disable(0).unwrap();
        assert!(PWM.active_mask().is_empty());
        assert!(!PWM.is_running());
        assert!(!TIMER.running());

        // A stale interrupt after the stop changes nothing
        let before = PORT.data();
        TIMER.take_rearms();
        tick(&TIMER, &VECTORS);
        assert_eq!(PORT.data(), before);
        assert!(TIMER.take_rearms().is_empty());

        // Restarting picks up the committed schedule directly
        PWM.set_duty(1, 100).unwrap();
        assert!(PWM.is_running());
        assert_eq!(PWM.active_schedule().len(), 2);
        assert!(!PWM.is_commit_pending());
    }
}

mod inputs {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(&PORT, &TIMER, PwmConfig::DEFAULT);

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_out_of_range_channel_is_ignored() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PORT.take_ops();

        PWM.set_duty(8, 100).unwrap();
        PWM.set_duty(200, 0).unwrap();
        assert!(PORT.take_ops().is_empty());
        assert!(PWM.active_mask().is_empty());
        assert_eq!(PWM.duty(8), None);
        assert!(!PWM.is_running());
        assert_eq!(TIMER.starts(), 0);
    }
}

mod analog {
    use super::*;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    static PWM: SimPwm = Pwm::new(&PORT, &TIMER, PwmConfig::DEFAULT);

    fn handler() {
        PWM.on_interrupt();
    }

    #[test]
    fn test_analog_write_maps_port_c() {
        PWM.init(&mut &VECTORS, handler).unwrap();
        PWM.analog_write(Pin::new(Port::C, 3), 300).unwrap();
        assert_eq!(PWM.duty(3), Some(255));
        assert_eq!(PORT.level(3), Level::High);

        PWM.analog_write(Pin::new(Port::C, 6), -5).unwrap();
        assert_eq!(PWM.duty(6), Some(0));
        assert_eq!(PORT.level(6), Level::Low);

        PWM.analog_write(Pin::new(Port::B, 3), 10).unwrap();
        PWM.analog_write(Pin::from_raw(0x30), 10).unwrap();
        assert_eq!(PWM.duty(3), Some(255));
        assert!(!PWM.is_running());
    }
}

mod config {
    use super::*;
    use agon_hal::ClockDivider;

    static PORT: SimPort = SimPort::new();
    static TIMER: SimTimer = SimTimer::new();
    static VECTORS: SimVectors = SimVectors::new();
    // 18.432 MHz / 4 at 50 Hz needs 360 ticks per step, past 16 bits per period
    static PWM: SimPwm = Pwm::new(
        &PORT,
        &TIMER,
        PwmConfig::DEFAULT.with_divider(ClockDivider::Div4),
    );

    fn handler() {}

    #[test]
    fn test_unrepresentable_period_is_rejected() {
        assert_eq!(PWM.init(&mut &VECTORS, handler), Err(RtError::InvalidConfig));
        assert_eq!(PWM.set_duty(0, 100), Err(RtError::InvalidConfig));
        assert!(VECTORS.handler(Vector::Prt1).is_none());
        assert_eq!(TIMER.starts(), 0);
    }
}
