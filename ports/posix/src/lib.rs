//! Host simulation of the Agon runtime core's hardware collaborators
//!
//! Provides in-memory stand-ins for the eZ80 programmable reload timers,
//! an 8-bit GPIO output port and the interrupt vector table, plus a ticker
//! thread that raises simulated timer interrupts. All simulated peripherals
//! are `const`-constructible and implement the HAL traits for shared
//! references, so they can back `static` clock and PWM singletons exactly
//! like the memory-mapped peripherals they replace.
//!
//! Simulated interrupt handlers run inside `critical_section::with`, which
//! on the host is the `critical-section` crate's global reentrant lock. This
//! gives foreground code the same guarantee it has on the target: code in a
//! critical section never observes a handler half-way through.

pub mod port;
pub mod ticker;
pub mod timer;
pub mod vectors;

pub use port::{PortOp, SimPort};
pub use ticker::Ticker;
pub use timer::SimTimer;
pub use vectors::SimVectors;
