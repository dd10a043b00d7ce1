//! Time sources for the session engine.
//!
//! Real-time budgets are measured against a monotonic [`Clock`]. Dodge challenges
//! additionally run a [`VirtualElapsed`] accumulator that is advanced per tick and
//! moves twice as fast while the pointer stays out of every hazard.

use chrono::{DateTime, Local};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Nominal progress tick period
pub const TICK_RATE_MS: u64 = 50;

/// Virtual time rate while the pointer is outside all hazards
pub const OUTSIDE_HAZARD_RATE: f64 = 2.0;

pub trait Clock {
    /// Monotonic time since the clock's origin
    fn now(&self) -> Duration;

    /// Local wall-clock time, used to stamp result entries
    fn wall(&self) -> DateTime<Local>;

    fn elapsed_since(&self, earlier: Duration) -> Duration {
        self.now().saturating_sub(earlier)
    }
}

/// Production clock backed by `Instant` and the local time zone
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
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hand-driven clock for tests and headless runs.
///
/// Clones share the same timeline, so a test can keep one handle and give the
/// other to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    elapsed: Rc<Cell<Duration>>,
    base: DateTime<Local>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
            base: Local::now(),
        }
    }

    pub fn advance(&self, delta: Duration) {
        self.elapsed.set(self.elapsed.get() + delta);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.elapsed.get()
    }

    fn wall(&self) -> DateTime<Local> {
        let offset =
            chrono::Duration::from_std(self.elapsed.get()).unwrap_or_else(|_| chrono::Duration::zero());
        self.base + offset
    }
}

/// Rate-scaled elapsed time for dodge challenges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualElapsed {
    elapsed: Duration,
}

impl VirtualElapsed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick of `delta` real time.
    pub fn advance(&mut self, delta: Duration, in_hazard: bool) {
        let scaled = if in_hazard {
            delta
        } else {
            delta.mul_f64(OUTSIDE_HAZARD_RATE)
        };
        self.elapsed += scaled;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn reached(&self, budget: Duration) -> bool {
        self.elapsed >= budget
    }
}

/// Remaining share of `budget` as a whole percentage in `0..=100`
pub fn percent_remaining(elapsed: Duration, budget: Duration) -> u8 {
    if budget.is_zero() {
        return 0;
    }
    let ratio = elapsed.as_secs_f64() / budget.as_secs_f64();
    (100.0 - 100.0 * ratio).clamp(0.0, 100.0).round() as u8
}
