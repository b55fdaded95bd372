//! Millisecond clocks for the game loop

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// Wall-clock source plus the throttle sleep
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_millis(&self) -> u64;
    /// Give up the CPU for `ms` milliseconds
    fn sleep_millis(&self, ms: u64);
}

/// Real time, backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_millis(&self, ms: u64) {
        thread::yield_now();
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}

/// Deterministic clock: time only moves when slept or advanced explicitly.
///
/// Each `now_millis` call may additionally cost `cost_per_read` ms, which lets
/// tests model frames that take real work.
#[derive(Debug, Default)]
pub struct SimulatedClock {
    now: Cell<u64>,
    cost_per_read: u64,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every read advances the clock by `ms` after returning
    pub fn with_read_cost(ms: u64) -> Self {
        Self {
            now: Cell::new(0),
            cost_per_read: ms,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for SimulatedClock {
    fn now_millis(&self) -> u64 {
        let t = self.now.get();
        self.now.set(t + self.cost_per_read);
        t
    }

    fn sleep_millis(&self, ms: u64) {
        self.advance(ms);
    }
}
