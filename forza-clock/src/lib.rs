//! Clock abstraction for the Forza telemetry listener.
//!
//! Provides a trait for reading the current time, with a real implementation
//! and several mocks so the ingest loop can be driven deterministically in
//! tests.
//!
//! Two readings are exposed:
//! - epoch seconds with sub-second precision, used for rate limiting
//! - the wall-clock instant, used to stamp captured telemetry records

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, NaiveDateTime};

/// Trait for getting the current time.
pub trait Clock: Send + Sync {
    /// Returns the current time as seconds since the Unix epoch.
    fn now_unix_secs(&self) -> f64;

    /// Returns the current wall-clock instant.
    ///
    /// Mock implementations must not advance time here; only
    /// `now_unix_secs` moves a mock clock forward.
    fn wall_clock(&self) -> NaiveDateTime;
}

/// Real system clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_secs(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }

    fn wall_clock(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Convert epoch seconds to a UTC wall-clock instant.
///
/// Mock clocks use UTC so test output does not depend on the host timezone.
pub fn wall_clock_at(secs: f64) -> NaiveDateTime {
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9) as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

/// Mock clock for testing with a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    secs: f64,
}

impl MockClock {
    /// Create a mock clock fixed at `secs` since the epoch.
    pub fn new(secs: f64) -> Self {
        Self { secs }
    }
}

impl Clock for MockClock {
    fn now_unix_secs(&self) -> f64 {
        self.secs
    }

    fn wall_clock(&self) -> NaiveDateTime {
        wall_clock_at(self.secs)
    }
}

/// Mock clock that auto-advances time on each `now_unix_secs` call.
///
/// Useful for simulating a sender that emits datagrams at a steady rate.
#[derive(Debug)]
pub struct AdvancingClock {
    secs_bits: AtomicU64,
    increment: f64,
}

impl AdvancingClock {
    /// Create an advancing clock starting at `secs` and moving by `increment` each call.
    pub fn new(secs: f64, increment: f64) -> Self {
        Self {
            secs_bits: AtomicU64::new(secs.to_bits()),
            increment,
        }
    }

    fn current(&self) -> f64 {
        f64::from_bits(self.secs_bits.load(Ordering::SeqCst))
    }
}

impl Clock for AdvancingClock {
    fn now_unix_secs(&self) -> f64 {
        let now = self.current();
        self.secs_bits
            .store((now + self.increment).to_bits(), Ordering::SeqCst);
        now
    }

    fn wall_clock(&self) -> NaiveDateTime {
        wall_clock_at(self.current())
    }
}

/// Mock clock that replays a fixed sequence of timestamps.
///
/// Each `now_unix_secs` call returns the next scripted value. Once the
/// script is exhausted the last value repeats.
#[derive(Debug)]
pub struct ScriptedClock {
    times: Vec<f64>,
    next: AtomicUsize,
}

impl ScriptedClock {
    /// Create a clock replaying `times` in order.
    pub fn new(times: impl Into<Vec<f64>>) -> Self {
        Self {
            times: times.into(),
            next: AtomicUsize::new(0),
        }
    }

    fn peek(&self) -> f64 {
        let idx = self.next.load(Ordering::SeqCst);
        self.times
            .get(idx)
            .or_else(|| self.times.last())
            .copied()
            .unwrap_or(0.0)
    }
}

impl Clock for ScriptedClock {
    fn now_unix_secs(&self) -> f64 {
        let now = self.peek();
        self.next.fetch_add(1, Ordering::SeqCst);
        now
    }

    fn wall_clock(&self) -> NaiveDateTime {
        wall_clock_at(self.peek())
    }
}
