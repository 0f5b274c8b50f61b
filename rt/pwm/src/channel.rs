//! Output channels and channel bitsets

use core::fmt;

use agon_rt_core::DUTY_MAX;

/// Number of PWM channels (one per port C pin)
pub const CHANNELS: usize = 8;

/// What a channel is doing for a given duty value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Duty 0: held low
    Off,
    /// Duty 255: held high
    On,
    /// Duty 1..=254: toggled by the event schedule
    Modulating(u8),
}

impl ChannelState {
    pub const fn from_duty(duty: u8) -> Self {
        match duty {
            0 => ChannelState::Off,
            DUTY_MAX => ChannelState::On,
            d => ChannelState::Modulating(d),
        }
    }

    pub const fn is_modulating(self) -> bool {
        matches!(self, ChannelState::Modulating(_))
    }
}

/// Set of channels, bit `n` standing for channel `n` (and port pin `n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMask(u8);

impl ChannelMask {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Mask holding only `channel`; empty for channels past the last one
    pub const fn single(channel: u8) -> Self {
        if (channel as usize) < CHANNELS {
            Self(1 << channel)
        } else {
            Self::EMPTY
        }
    }

    pub const fn contains(self, channel: u8) -> bool {
        self.0 & Self::single(channel).0 != 0
    }

    pub fn insert(&mut self, channel: u8) {
        self.0 |= Self::single(channel).0;
    }

    pub fn remove(&mut self, channel: u8) {
        self.0 &= !Self::single(channel).0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Channels in the set, lowest first
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..CHANNELS as u8).filter(move |&ch| self.contains(ch))
    }
}

impl fmt::Display for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010b}", self.0)
    }
}
