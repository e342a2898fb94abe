//! Bomb timer authority.
//!
//! Single shared countdown, server-owned. Running -> Expired is one-way;
//! deltas clamp at zero and hitting exactly zero is terminal. `pause` is used
//! once, when the final puzzle is solved, to freeze the clock at solve time.

#[derive(Debug)]
pub struct BombTimer {
    remaining: f64,
    paused: bool,
    expired: bool,
}

impl BombTimer {
    pub fn new(secs: f64) -> Self {
        Self {
            remaining: secs.max(0.0),
            paused: false,
            expired: false,
        }
    }

    /// Decrement by elapsed wall-clock time. Returns true on the tick that
    /// transitions the timer to Expired.
    pub fn tick(&mut self, dt: f64) -> bool {
        if self.paused || self.expired {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.expired = true;
            return true;
        }
        false
    }

    /// Apply a penalty/bonus delta, clamped to `[0, +inf)`. Returns true if
    /// the delta drove the timer to zero and it just expired.
    pub fn modify(&mut self, delta: f64) -> bool {
        if self.expired || self.paused {
            return false;
        }
        self.remaining = (self.remaining + delta).max(0.0);
        if self.remaining == 0.0 {
            self.expired = true;
            return true;
        }
        false
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Whole seconds for display, rounded down, never negative.
    pub fn display_secs(&self) -> u64 {
        self.remaining.max(0.0).floor() as u64
    }
}
