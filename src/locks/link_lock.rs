//! The link lock engine.

use super::identity::LockIdentity;
use super::payload::LockPayload;
use super::types::{RetryPolicy, Wait};
use crate::clock::{Clock, SystemClock};
use crate::config::LockConfig;
use crate::error::{LockError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A cross-process lock on one target path.
///
/// Each instance owns a private marker file. Acquiring hard-links the marker
/// onto the shared indicator; `link(2)` fails if the indicator already
/// exists, so exactly one contender wins each race. While held, the marker's
/// link count is 2, which is how an instance recognizes its own lock.
///
/// The marker is removed when the instance is dropped. Dropping does not
/// release a held lock: use [`LinkLock::release`] or [`LinkLock::lock`] for
/// that.
#[derive(Debug)]
pub struct LinkLock {
    identity: LockIdentity,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    expires_in: Duration,
}

impl LinkLock {
    /// Create a lock on `target` using the system clock.
    pub fn new<P: AsRef<Path>>(target: P, config: &LockConfig) -> Result<Self> {
        Self::with_clock(target, config, Arc::new(SystemClock))
    }

    /// Create a lock on `target` with an explicit clock.
    pub fn with_clock<P: AsRef<Path>>(
        target: P,
        config: &LockConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let identity = LockIdentity::resolve(target, config)?;
        Self::from_identity(identity, config.retry_policy(), clock)
    }

    /// Create a lock from a pre-resolved identity.
    ///
    /// Creates the lock directory and the unique marker.
    pub fn from_identity(
        identity: LockIdentity,
        retry: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let lock = Self {
            expires_in: identity.default_expires_in(),
            identity,
            retry,
            clock,
        };
        lock.create_marker()?;
        Ok(lock)
    }

    pub fn identity(&self) -> &LockIdentity {
        &self.identity
    }

    pub fn target_path(&self) -> &Path {
        self.identity.target_path()
    }

    pub(super) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn marker(&self) -> &Path {
        self.identity.unique_marker_path()
    }

    fn indicator(&self) -> &Path {
        self.identity.shared_indicator_path()
    }

    /// Acquire the lock.
    ///
    /// `wait` falls back to the identity's default timeout and `expires_in`
    /// to the instance default; an explicit `expires_in` becomes the new
    /// instance default. A zero expiration means the lock never expires.
    ///
    /// # Errors
    ///
    /// * `LockFailed` - the marker could not be created
    /// * `AlreadyLocked` - contended and `wait` is `Wait::Immediate`
    /// * `Timeout` - still contended when the deadline passed
    /// * `Io` - the link attempt failed for a reason other than contention
    pub fn acquire(&mut self, wait: Option<Wait>, expires_in: Option<Duration>) -> Result<()> {
        let wait = wait.unwrap_or(self.identity.default_timeout()).normalized();
        if let Some(expires_in) = expires_in {
            self.expires_in = expires_in;
        }

        if !self.marker().exists() {
            self.create_marker()?;
        }

        let deadline = match wait {
            Wait::For(timeout) => TimeDelta::from_std(timeout)
                .ok()
                .and_then(|delta| self.clock.now().checked_add_signed(delta)),
            Wait::Forever | Wait::Immediate => None,
        };

        loop {
            self.clear_expired()?;

            match fs::hard_link(self.marker(), self.indicator()) {
                Ok(()) => {
                    self.write_payload(self.clock.now())?;
                    debug!(
                        target_path = %self.target_path().display(),
                        indicator = %self.indicator().display(),
                        "lock acquired"
                    );
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(LockError::io(
                        format!(
                            "failed to link '{}' to '{}'",
                            self.marker().display(),
                            self.indicator().display()
                        ),
                        e,
                    ));
                }
            }

            // Our marker is already the indicator, e.g. acquire called twice.
            if self.marker_link_count() == Some(2) {
                if expires_in.is_some() {
                    let acquired_at = self
                        .read_payload()
                        .ok()
                        .flatten()
                        .and_then(|p| p.acquired_at)
                        .unwrap_or_else(|| self.clock.now());
                    self.write_payload(acquired_at)?;
                }
                debug!(
                    target_path = %self.target_path().display(),
                    "lock already held by this instance"
                );
                return Ok(());
            }

            let pause = match (wait, deadline) {
                (Wait::Immediate, _) => {
                    return Err(LockError::AlreadyLocked(self.target_path().to_path_buf()));
                }
                (Wait::For(_), Some(deadline)) => {
                    let now = self.clock.now();
                    if now > deadline {
                        return Err(LockError::Timeout(self.target_path().to_path_buf()));
                    }
                    let remaining = (deadline - now).to_std().unwrap_or_default();
                    self.retry.pause_for(remaining)
                }
                (Wait::Forever, _) | (Wait::For(_), None) => self.retry.poll_interval,
            };

            debug!(
                target_path = %self.target_path().display(),
                pause_ms = pause.as_millis() as u64,
                "lock contended, retrying"
            );
            self.clock.sleep(pause);
        }
    }

    /// Release the lock.
    ///
    /// # Errors
    ///
    /// * `NotLocked` - nobody holds the lock (or it expired)
    /// * `NotMyLock` - someone else holds it; the indicator is left alone
    /// * `Io` - the indicator could not be removed
    pub fn release(&mut self) -> Result<()> {
        if !self.is_locked() {
            return Err(LockError::NotLocked(self.target_path().to_path_buf()));
        }
        if !self.i_am_locking() {
            return Err(LockError::NotMyLock(self.target_path().to_path_buf()));
        }

        self.break_lock()?;
        debug!(target_path = %self.target_path().display(), "lock released");
        Ok(())
    }

    /// Whether anyone holds the lock.
    ///
    /// An expired indicator counts as unlocked and is deleted on the spot.
    pub fn is_locked(&self) -> bool {
        if let Err(e) = self.clear_expired() {
            warn!(
                indicator = %self.indicator().display(),
                error = %e,
                "failed to clear expired lock"
            );
        }
        self.indicator().exists()
    }

    /// Whether this instance holds the lock.
    pub fn i_am_locking(&self) -> bool {
        self.is_locked() && self.holds_indicator().unwrap_or(false)
    }

    /// Delete the indicator regardless of who holds it.
    ///
    /// Returns whether an indicator was removed.
    pub fn break_lock(&self) -> Result<bool> {
        match fs::remove_file(self.indicator()) {
            Ok(()) => {
                debug!(indicator = %self.indicator().display(), "lock indicator removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(LockError::io(
                format!("failed to remove lock '{}'", self.indicator().display()),
                e,
            )),
        }
    }

    /// Remove the indicator if it has expired.
    fn clear_expired(&self) -> Result<bool> {
        if !self.is_lock_expired() {
            return Ok(false);
        }
        debug!(indicator = %self.indicator().display(), "breaking expired lock");
        self.break_lock()
    }

    /// Marker linked exactly once more, and that link is the indicator.
    fn holds_indicator(&self) -> io::Result<bool> {
        if link_count(self.marker())? != Some(2) {
            return Ok(false);
        }
        match (file_id(self.marker())?, file_id(self.indicator())?) {
            (Some(marker), Some(indicator)) => Ok(marker == indicator),
            _ => Ok(false),
        }
    }

    /// Create the unique marker with exclusive-create semantics.
    fn create_marker(&self) -> Result<()> {
        let marker = self.marker();
        let failed = |source: io::Error| LockError::LockFailed {
            path: marker.to_path_buf(),
            source,
        };

        if let Some(parent) = marker.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(failed)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(marker)
            .map_err(failed)?;

        let written = LockPayload::for_current_process(Duration::ZERO)
            .to_json()
            .and_then(|payload| file.write_all(payload.as_bytes()))
            .and_then(|()| file.sync_all());
        if let Err(e) = written {
            let _ = fs::remove_file(marker);
            return Err(failed(e));
        }

        debug!(marker = %marker.display(), "unique marker created");
        Ok(())
    }

    /// Rewrite the shared inode's payload after a successful link.
    ///
    /// Written in place: replacing the file would break the link.
    fn write_payload(&self, acquired_at: DateTime<Utc>) -> Result<()> {
        LockPayload::for_current_process(self.expires_in)
            .acquired_at(acquired_at)
            .to_json()
            .and_then(|payload| {
                let mut file = OpenOptions::new()
                    .write(true)
                    .truncate(true)
                    .open(self.indicator())?;
                file.write_all(payload.as_bytes())?;
                file.sync_all()
            })
            .map_err(|e| {
                LockError::io(
                    format!("failed to write lock payload '{}'", self.indicator().display()),
                    e,
                )
            })
    }
}

impl Drop for LinkLock {
    fn drop(&mut self) {
        match fs::remove_file(self.marker()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                marker = %self.marker().display(),
                error = %e,
                "failed to remove unique marker"
            ),
        }
    }
}

/// Device and inode of `path`, `None` if it does not exist.
fn file_id(path: &Path) -> io::Result<Option<(u64, u64)>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some((meta.dev(), meta.ino()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Hard link count of `path`, `None` if it does not exist.
pub(super) fn link_count(path: &Path) -> io::Result<Option<u64>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.nlink())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
