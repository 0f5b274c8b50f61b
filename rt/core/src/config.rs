//! Timer configuration for the timebase and the PWM engine
//!
//! Both configurations are plain `Copy` values with `const` builders so they
//! can be written into `static` initialisers. Nothing is checked until
//! `validate()` runs during the owning component's `init`.

use agon_hal::{ClockDivider, Vector};

use crate::{RtError, RtResult};

/// System clock of the Agon Light 2 eZ80F92
pub const AGON_CPU_HZ: u32 = 18_432_000;

/// Number of duty levels per PWM period
pub const DUTY_RESOLUTION: u32 = 256;

/// Highest duty threshold; a full PWM period spans this many steps
pub const DUTY_MAX: u8 = 255;

/// Millisecond timebase configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    pub core_clock_hz: u32,
    pub divider: ClockDivider,
    /// Interrupt rate; one interrupt advances the counter by one millisecond,
    /// so anything but [`ClockConfig::TICK_HZ`] fails validation
    pub tick_hz: u32,
    /// Vector of the timer driving the timebase
    pub vector: Vector,
}

impl ClockConfig {
    /// The only tick rate that keeps the counter in milliseconds
    pub const TICK_HZ: u32 = 1000;

    /// 1 kHz from the system clock divided by 64 (reload 288)
    pub const DEFAULT: Self = Self {
        core_clock_hz: AGON_CPU_HZ,
        divider: ClockDivider::Div64,
        tick_hz: 1000,
        vector: Vector::Prt0,
    };

    pub const fn new() -> Self {
        Self::DEFAULT
    }

    pub const fn with_core_clock(mut self, hz: u32) -> Self {
        self.core_clock_hz = hz;
        self
    }

    pub const fn with_divider(mut self, divider: ClockDivider) -> Self {
        self.divider = divider;
        self
    }

    pub const fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_hz = hz;
        self
    }

    pub const fn with_vector(mut self, vector: Vector) -> Self {
        self.vector = vector;
        self
    }

    /// Timer input frequency after the prescaler
    pub const fn timer_hz(&self) -> u32 {
        self.core_clock_hz / self.divider.divisor()
    }

    /// Timer ticks per interrupt period, at least 1
    pub const fn reload(&self) -> u32 {
        if self.tick_hz == 0 {
            return 1;
        }
        let reload = self.timer_hz() / self.tick_hz;
        if reload == 0 {
            1
        } else {
            reload
        }
    }

    /// Convert timer ticks elapsed within a period to microseconds (truncating)
    pub const fn ticks_to_us(&self, ticks: u16) -> u32 {
        (ticks as u32) * 1000 / (self.timer_hz() / 1000)
    }

    /// Check the configuration and return the 16-bit reload value
    pub fn validate(&self) -> RtResult<u16> {
        if self.tick_hz != Self::TICK_HZ || self.timer_hz() < 1000 {
            return Err(RtError::InvalidConfig);
        }
        u16::try_from(self.reload()).map_err(|_| RtError::InvalidConfig)
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Software PWM configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmConfig {
    pub core_clock_hz: u32,
    pub divider: ClockDivider,
    /// PWM base frequency (full periods per second)
    pub frequency_hz: u32,
    /// Poll iterations to wait for the interrupt handler to adopt a schedule
    pub commit_spin_limit: u32,
    /// Vector of the timer driving the event schedule
    pub vector: Vector,
}

impl PwmConfig {
    /// 50 Hz from the system clock divided by 16 (90 ticks per duty step)
    pub const DEFAULT: Self = Self {
        core_clock_hz: AGON_CPU_HZ,
        divider: ClockDivider::Div16,
        frequency_hz: 50,
        commit_spin_limit: 2_000_000,
        vector: Vector::Prt1,
    };

    pub const fn new() -> Self {
        Self::DEFAULT
    }

    pub const fn with_core_clock(mut self, hz: u32) -> Self {
        self.core_clock_hz = hz;
        self
    }

    pub const fn with_divider(mut self, divider: ClockDivider) -> Self {
        self.divider = divider;
        self
    }

    pub const fn with_frequency(mut self, hz: u32) -> Self {
        self.frequency_hz = hz;
        self
    }

    pub const fn with_commit_spin_limit(mut self, polls: u32) -> Self {
        self.commit_spin_limit = polls;
        self
    }

    pub const fn with_vector(mut self, vector: Vector) -> Self {
        self.vector = vector;
        self
    }

    /// Timer input frequency after the prescaler
    pub const fn timer_hz(&self) -> u32 {
        self.core_clock_hz / self.divider.divisor()
    }

    /// Timer ticks per duty step: `(core / divider) / (frequency * 256)`, at least 1
    pub const fn ticks_per_step(&self) -> u32 {
        let denom = self.frequency_hz.saturating_mul(DUTY_RESOLUTION);
        if denom == 0 {
            return 1;
        }
        let step = self.timer_hz() / denom;
        if step == 0 {
            1
        } else {
            step
        }
    }

    /// Timer ticks in one full PWM period
    pub const fn period_ticks(&self) -> u32 {
        self.ticks_per_step() * DUTY_MAX as u32
    }

    /// Check the configuration and return the ticks per duty step
    ///
    /// The longest event delay is a full period, which must fit the 16-bit
    /// reload register.
    pub fn validate(&self) -> RtResult<u16> {
        if self.frequency_hz == 0 || self.period_ticks() > u16::MAX as u32 {
            return Err(RtError::InvalidConfig);
        }
        u16::try_from(self.ticks_per_step()).map_err(|_| RtError::InvalidConfig)
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
