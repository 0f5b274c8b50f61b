//! Errors reported by the peripheral drivers

use core::fmt;

/// Peripheral access errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Pin index past the end of an 8-bit port
    InvalidPin,
    /// No programmable reload timer with this index
    InvalidTimer,
    /// A countdown of zero ticks was requested
    ZeroReload,
    /// Timer re-armed before it was ever started
    NotStarted,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin => write!(f, "pin index out of range"),
            Self::InvalidTimer => write!(f, "no such timer"),
            Self::ZeroReload => write!(f, "zero reload value"),
            Self::NotStarted => write!(f, "timer not started"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;
