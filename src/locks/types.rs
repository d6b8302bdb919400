//! Lock policy and reporting types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// How long an acquisition keeps retrying while the lock is contended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Retry until the lock is obtained.
    Forever,
    /// Fail at the first contention with `AlreadyLocked`.
    Immediate,
    /// Retry until the deadline, then fail with `Timeout`.
    For(Duration),
}

impl Wait {
    /// Map a timeout in seconds to a wait policy.
    ///
    /// `None` blocks forever; zero, negative or NaN fails immediately;
    /// a value too large to represent blocks forever.
    pub fn from_secs(timeout: Option<f64>) -> Self {
        match timeout {
            None => Wait::Forever,
            Some(secs) if secs.is_nan() || secs <= 0.0 => Wait::Immediate,
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Wait::For)
                .unwrap_or(Wait::Forever),
        }
    }

    pub(crate) fn normalized(self) -> Self {
        match self {
            Wait::For(d) if d.is_zero() => Wait::Immediate,
            other => other,
        }
    }
}

/// Retry cadence for the acquisition loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts under `Wait::Forever`.
    pub poll_interval: Duration,
    /// Lower bound on the pause under `Wait::For`.
    pub min_poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            min_poll_interval: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Pause before the next attempt when `remaining` is left until the deadline.
    ///
    /// One tenth of the remaining time, never below `min_poll_interval`.
    pub fn pause_for(&self, remaining: Duration) -> Duration {
        (remaining / 10).max(self.min_poll_interval)
    }
}

/// Point-in-time view of a lock, as reported by `LinkLock::status`.
#[derive(Debug, Clone, Serialize)]
pub struct LockStatus {
    /// The protected resource.
    pub target: PathBuf,

    /// The shared indicator path contenders rendezvous on.
    pub indicator: PathBuf,

    /// Whether the indicator exists and has not expired.
    pub locked: bool,

    /// Whether the observing instance is the holder.
    pub held_by_me: bool,

    /// Process id recorded by the holder, if readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_pid: Option<u32>,

    /// Indicator creation time, if readable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Seconds since creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifetime_secs: Option<f64>,

    /// Persisted expiration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<f64>,

    /// Whether the indicator was expired when observed.
    pub expired: bool,
}

impl std::fmt::Display for LockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.locked {
            write!(f, "{} is not locked", self.target.display())?;
            if self.expired {
                write!(f, " (expired lock cleared)")?;
            }
            return Ok(());
        }

        write!(f, "{} is locked", self.target.display())?;
        if let Some(pid) = self.holder_pid {
            write!(f, " (pid: {}", pid)?;
        } else {
            write!(f, " (pid: unknown")?;
        }
        if let Some(age) = self.lifetime_secs {
            write!(f, ", age: {:.1}s", age)?;
        }
        match self.expires_in_secs {
            Some(secs) => write!(f, ", expires after {}s)", secs),
            None => write!(f, ", never expires)"),
        }
    }
}
