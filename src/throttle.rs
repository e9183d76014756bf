//! Leading-edge rate limiting with an injectable clock.
//!
//! The first call in a quiet period is admitted and opens a cooldown window;
//! calls inside the window are dropped, never queued or replayed.

#[cfg(test)]
#[path = "throttle_test.rs"]
mod throttle_test;

use std::cell::Cell;
use std::rc::Rc;

/// Source of monotonic-enough wall time in milliseconds.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: f64) -> Self {
        Self { now: Rc::new(Cell::new(start_ms)) }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Leading-edge throttle with a fixed cooldown.
#[derive(Debug, Clone)]
pub struct Throttle {
    cooldown_ms: f64,
    open_at: Option<f64>,
}

impl Throttle {
    #[must_use]
    pub fn new(cooldown_ms: f64) -> Self {
        Self { cooldown_ms, open_at: None }
    }

    /// Whether a call at `now_ms` may proceed. Admitting starts a new cooldown.
    ///
    /// A reading earlier than the last admitted one means the clock stepped
    /// back; the window restarts from that reading.
    pub fn admit(&mut self, now_ms: f64) -> bool {
        if let Some(open_at) = self.open_at {
            let admitted_at = open_at - self.cooldown_ms;
            if now_ms < open_at && now_ms >= admitted_at {
                return false;
            }
            if now_ms < admitted_at {
                log::debug!("clock stepped back {}ms, restarting throttle", admitted_at - now_ms);
            }
        }
        self.open_at = Some(now_ms + self.cooldown_ms);
        true
    }
}
