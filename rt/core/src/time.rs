//! Wrapping time values
//!
//! Both counters wrap silently at 32 bits (about 49.7 days for
//! milliseconds, about 71.6 minutes for microseconds). Differences are
//! taken with wrapping subtraction, so an interval measured across a wrap
//! is still correct as long as it is shorter than the full counter range.

use core::fmt;

/// Milliseconds since the timebase was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millis(u32);

impl Millis {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Create from a raw millisecond count
    pub const fn new(ms: u32) -> Self {
        Self(ms)
    }

    /// Get the raw millisecond count
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Milliseconds elapsed since an earlier reading (handles wraparound)
    pub const fn elapsed_since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Check if this reading is after another one (handles wraparound)
    pub const fn is_after(self, other: Millis) -> bool {
        let delta = self.0.wrapping_sub(other.0);
        delta != 0 && delta < u32::MAX / 2
    }

    /// Advance by `ms`, wrapping
    pub const fn wrapping_add(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }

    /// Convert to microseconds, wrapping
    pub const fn to_micros(self) -> Micros {
        Micros(self.0.wrapping_mul(1000))
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Millis {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}ms", self.0);
    }
}

/// Microseconds since the timebase was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Micros(u32);

impl Micros {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Create from a raw microsecond count
    pub const fn new(us: u32) -> Self {
        Self(us)
    }

    /// Get the raw microsecond count
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Microseconds elapsed since an earlier reading (handles wraparound)
    pub const fn elapsed_since(self, earlier: Micros) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Check if this reading is after another one (handles wraparound)
    pub const fn is_after(self, other: Micros) -> bool {
        let delta = self.0.wrapping_sub(other.0);
        delta != 0 && delta < u32::MAX / 2
    }

    /// Advance by `us`, wrapping
    pub const fn wrapping_add(self, us: u32) -> Self {
        Self(self.0.wrapping_add(us))
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Micros {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}us", self.0);
    }
}
