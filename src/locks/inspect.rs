//! Read-side bookkeeping: creation time, lifetime, expiration and status.
//!
//! These reads are advisory. The `read_*` helpers keep "absent" (`Ok(None)`)
//! apart from "unreadable" (`Err`); the public getters and the expiration
//! policy collapse both to conservative defaults.

use super::link_lock::{LinkLock, link_count};
use super::payload::LockPayload;
use super::types::LockStatus;
use chrono::{DateTime, TimeDelta, Utc};
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::time::Duration;

impl LinkLock {
    /// Acquisition time recorded by the holder, else the indicator change time.
    ///
    /// The change time moves whenever the shared inode is linked or
    /// unlinked, so it is only used for payloads without a timestamp.
    pub(super) fn read_createtime(&self) -> io::Result<Option<DateTime<Utc>>> {
        if let Some(acquired_at) = self.read_payload()?.and_then(|p| p.acquired_at) {
            return Ok(Some(acquired_at));
        }
        read_ctime(self.identity().shared_indicator_path())
    }

    /// Indicator payload.
    pub(super) fn read_payload(&self) -> io::Result<Option<LockPayload>> {
        match fs::read_to_string(self.identity().shared_indicator_path()) {
            Ok(text) => Ok(Some(LockPayload::parse(&text))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// When the current indicator was created; `None` if absent or unreadable.
    pub fn get_lock_createtime(&self) -> Option<DateTime<Utc>> {
        self.read_createtime().ok().flatten()
    }

    /// Time elapsed since the indicator was created.
    pub fn get_lock_lifetime(&self) -> Option<TimeDelta> {
        self.get_lock_createtime()
            .map(|created| self.clock().now() - created)
    }

    /// Expiration persisted by the current holder, if any.
    pub fn lock_expiration(&self) -> Option<Duration> {
        self.read_payload().ok().flatten().and_then(|p| p.expires_in)
    }

    /// Whether the current indicator has outlived its persisted expiration.
    pub fn is_lock_expired(&self) -> bool {
        is_expired(
            self.lock_expiration(),
            self.read_createtime(),
            self.clock().now(),
        )
    }

    /// Snapshot of the lock as seen by this instance.
    ///
    /// Observing an expired lock clears it, like `is_locked`.
    pub fn status(&self) -> LockStatus {
        let payload = self.read_payload().ok().flatten();
        let created_at = self.get_lock_createtime();
        let now = self.clock().now();
        let expired = self.is_lock_expired();
        let locked = self.is_locked();
        let held_by_me = locked && self.i_am_locking();

        LockStatus {
            target: self.target_path().to_path_buf(),
            indicator: self.identity().shared_indicator_path().to_path_buf(),
            locked,
            held_by_me,
            holder_pid: payload.as_ref().and_then(|p| p.pid).filter(|_| locked),
            created_at: created_at.filter(|_| locked),
            lifetime_secs: created_at
                .filter(|_| locked)
                .map(|created| (now - created).num_milliseconds() as f64 / 1000.0),
            expires_in_secs: payload
                .and_then(|p| p.expires_in)
                .filter(|_| locked)
                .map(|d| d.as_secs_f64()),
            expired,
        }
    }

    /// Link count of this instance's marker, `None` if it is gone.
    pub(super) fn marker_link_count(&self) -> Option<u64> {
        link_count(self.identity().unique_marker_path()).ok().flatten()
    }
}

fn read_ctime(path: &Path) -> io::Result<Option<DateTime<Utc>>> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    DateTime::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32)
        .map(Some)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "ctime out of range"))
}

/// Expiration policy.
///
/// No expiration lives forever. A lock with an expiration but no readable
/// creation time counts as expired, so corrupt state can be reclaimed.
pub(super) fn is_expired(
    expires_in: Option<Duration>,
    created: io::Result<Option<DateTime<Utc>>>,
    now: DateTime<Utc>,
) -> bool {
    let Some(expires_in) = expires_in.filter(|d| !d.is_zero()) else {
        return false;
    };
    let Ok(Some(created)) = created else {
        return true;
    };
    match TimeDelta::from_std(expires_in) {
        Ok(limit) => now - created > limit,
        Err(_) => false,
    }
}
