#![no_std]

//! # Agon Clock
//!
//! Millisecond timebase driven by a periodic hardware timer interrupt, with
//! microsecond readings interpolated from the timer's down-counter.
//!
//! The clock is a process-wide singleton: construct it in a `static`, route
//! the timer's vector to a plain `fn()` that calls [`Clock::on_interrupt`],
//! and call [`Clock::init`] exactly once at startup.
//!
//! ```ignore
//! static CLOCK: Clock<BoardTimer> = Clock::new(BOARD_PRT0, ClockConfig::DEFAULT);
//!
//! fn prt0_handler() {
//!     CLOCK.on_interrupt();
//! }
//!
//! CLOCK.init(&mut vectors, prt0_handler)?;
//! CLOCK.delay(250);
//! ```

pub mod clock;
pub mod stopwatch;

pub use clock::{Clock, Snapshot};
pub use stopwatch::Stopwatch;
