//! Minimum-spacing rate limiter.
//!
//! Admits a tick only when at least `limit` seconds have passed since the
//! last admitted tick. This bounds the spacing between forwarded records,
//! not the number of records over a window.

/// Default minimum spacing between admitted ticks, in seconds.
pub const DEFAULT_LIMIT_SECS: f64 = 10.0;

/// Rate limiter state, owned by the ingest loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiter {
    limit_secs: f64,
    last_accepted: Option<f64>,
}

impl RateLimiter {
    /// Create a limiter. A limit of zero disables gating.
    pub fn new(limit_secs: f64) -> Self {
        Self {
            limit_secs,
            last_accepted: None,
        }
    }

    pub fn limit_secs(&self) -> f64 {
        self.limit_secs
    }

    /// Time of the last admitted tick, if any.
    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    pub fn is_disabled(&self) -> bool {
        self.limit_secs == 0.0
    }

    /// Decide whether the tick at `now` (seconds) is admitted.
    ///
    /// With gating disabled every tick is admitted and no state changes.
    pub fn admit(&mut self, now: f64) -> bool {
        if self.is_disabled() {
            return true;
        }

        let due = match self.last_accepted {
            None => true,
            Some(last) => now >= last + self.limit_secs,
        };
        if due {
            self.last_accepted = Some(now);
        }
        due
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_SECS)
    }
}
