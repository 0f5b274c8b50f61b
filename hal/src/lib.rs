//! Hardware Abstraction Layer (HAL) for eZ80F92-based boards
//!
//! This crate exposes the few peripherals the runtime core drives as traits,
//! together with register-level implementations built on a single
//! [`io::IoBus`] accessor:
//!
//! - [`gpio`] – output ports and packed pin numbers
//! - [`timer`] – programmable reload timers (PRT)
//! - [`interrupt`] – interrupt vector installation and global enable
//!
//! The traits are what the clock and PWM crates are written against; the
//! register implementations are what a board wires them to.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod error;
pub mod gpio;
pub mod interrupt;
pub mod io;
pub mod timer;

// Re-export commonly used types
pub use error::{HalError, HalResult};
pub use gpio::{GpioPort, Level, OutputPort, Pin, Port};
pub use interrupt::{Handler, Vector, VectorTable};
pub use io::IoBus;
pub use timer::{ClockDivider, CountdownTimer, PrtTimer, TimerMode};
