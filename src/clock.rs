//! Time source used by the lock engine.
//!
//! Acquisition is a polling loop: check, attempt the link, sleep, repeat.
//! Both "what time is it" and "wait a bit" go through the [`Clock`] trait so
//! the whole retry/timeout state machine can run in tests without real
//! wall-clock delay.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// Source of the current time and of blocking pauses.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The real clock: `Utc::now()` and `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when told to.
///
/// `sleep` returns immediately and advances the clock by the requested
/// duration, recording each pause so tests can assert on the retry cadence.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Create a clock frozen at the current wall-clock time.
    ///
    /// Lock creation times come from the filesystem, so tests that mix real
    /// files with manual time should start from "now".
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move the clock forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poison| poison.into_inner());
        if let Some(next) = TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
        {
            *now = next;
        }
    }

    /// All pauses requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(duration);
        self.advance(duration);
    }
}
