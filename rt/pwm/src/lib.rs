#![no_std]

//! # Agon PWM
//!
//! Software PWM for the eight port C pins of an eZ80F92 board, driven by a
//! single programmable reload timer.
//!
//! The duty table is compiled into a sorted list of at most nine timer
//! events ([`Schedule`]). The timer interrupt runs one event at a time and
//! re-arms itself with that event's delay, so an interrupt only fires where
//! some pin actually changes.
//!
//! ```ignore
//! static PWM: Pwm<BoardPort, BoardTimer> = Pwm::new(BOARD_PORT_C, BOARD_PRT1, PwmConfig::DEFAULT);
//!
//! fn prt1_handler() {
//!     PWM.on_interrupt();
//! }
//!
//! PWM.init(&mut vectors, prt1_handler)?;
//! PWM.set_duty(0, 64)?;
//! PWM.set_duty(1, 192)?;
//! ```

pub mod channel;
pub mod engine;
pub mod schedule;

pub use channel::{ChannelMask, ChannelState, CHANNELS};
pub use engine::Pwm;
pub use schedule::{Event, Schedule, MAX_EVENTS};
