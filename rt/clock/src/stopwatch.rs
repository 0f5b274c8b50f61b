//! Benchmarking helper
//!
//! Starting and stopping only capture raw snapshots; conversion to
//! microseconds happens afterwards so the measured section carries as
//! little overhead as possible.

use agon_hal::CountdownTimer;

use crate::clock::{Clock, Snapshot};

/// Measures elapsed microseconds between two points on a [`Clock`]
pub struct Stopwatch<'a, T> {
    clock: &'a Clock<T>,
    start: Snapshot,
}

impl<'a, T: CountdownTimer> Stopwatch<'a, T> {
    /// Begin measuring
    pub fn start(clock: &'a Clock<T>) -> Self {
        let start = clock.snapshot();
        Self { clock, start }
    }

    /// Snapshot taken at start
    pub fn started_at(&self) -> Snapshot {
        self.start
    }

    /// Microseconds since start (wraps after about 71 minutes)
    pub fn elapsed_us(&self) -> u32 {
        let end = self.clock.snapshot();
        self.clock
            .to_micros(end)
            .elapsed_since(self.clock.to_micros(self.start))
    }

    /// Return the elapsed time and start a new measurement
    pub fn lap(&mut self) -> u32 {
        let end = self.clock.snapshot();
        let elapsed = self
            .clock
            .to_micros(end)
            .elapsed_since(self.clock.to_micros(self.start));
        self.start = end;
        elapsed
    }
}
