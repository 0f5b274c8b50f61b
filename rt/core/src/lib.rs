#![no_std]

//! # Agon RT Core
//!
//! Types shared by the timebase and software PWM crates: the runtime error
//! type, board configuration, wrapping time values, and the flag-gated
//! double buffer used to hand data from foreground code to an interrupt
//! handler.

use core::fmt;

use agon_hal::HalError;

pub mod config;
pub mod sync;
pub mod time;

pub use config::{ClockConfig, PwmConfig, AGON_CPU_HZ, DUTY_MAX, DUTY_RESOLUTION};
pub use sync::PublishCell;
pub use time::{Micros, Millis};

/// Runtime core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the runtime core
pub type RtResult<T> = Result<T, RtError>;

/// Error types for runtime core operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtError {
    /// A peripheral rejected an operation
    Hal(HalError),
    /// Configuration values do not fit the hardware
    InvalidConfig,
    /// The interrupt handler did not adopt a published schedule in time
    CommitTimeout,
    /// Another foreground caller is already publishing
    Busy,
}

impl From<HalError> for RtError {
    fn from(err: HalError) -> Self {
        RtError::Hal(err)
    }
}

impl fmt::Display for RtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtError::Hal(err) => write!(f, "Hardware error: {}", err),
            RtError::InvalidConfig => write!(f, "Invalid configuration"),
            RtError::CommitTimeout => write!(f, "Schedule commit timed out"),
            RtError::Busy => write!(f, "Publish already in progress"),
        }
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for RtError {}

#[cfg(feature = "defmt")]
impl defmt::Format for RtError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            RtError::Hal(err) => defmt::write!(fmt, "Hal({})", err),
            RtError::InvalidConfig => defmt::write!(fmt, "InvalidConfig"),
            RtError::CommitTimeout => defmt::write!(fmt, "CommitTimeout"),
            RtError::Busy => defmt::write!(fmt, "Busy"),
        }
    }
}
