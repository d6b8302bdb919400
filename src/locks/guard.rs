//! RAII lock guard implementation.

use super::link_lock::LinkLock;
use super::types::Wait;
use crate::error::Result;
use std::time::Duration;
use tracing::warn;

/// RAII guard for a held link lock.
///
/// When dropped, the lock is released. If release fails, a warning is
/// logged but no panic occurs.
#[derive(Debug)]
pub struct LinkLockGuard<'a> {
    lock: &'a mut LinkLock,

    /// Whether the lock has been released manually.
    released: bool,
}

impl LinkLockGuard<'_> {
    /// The lock this guard holds.
    pub fn lock(&self) -> &LinkLock {
        &*self.lock
    }

    /// Manually release the lock.
    ///
    /// This is useful when you want to release the lock before the guard
    /// goes out of scope, and want to handle errors explicitly.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release()
    }
}

impl Drop for LinkLockGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.lock.release()
        {
            warn!(
                target_path = %self.lock.target_path().display(),
                error = %e,
                "failed to release lock"
            );
        }
    }
}

impl LinkLock {
    /// Acquire the lock and return a guard that releases it on drop.
    pub fn lock(
        &mut self,
        wait: Option<Wait>,
        expires_in: Option<Duration>,
    ) -> Result<LinkLockGuard<'_>> {
        self.acquire(wait, expires_in)?;
        Ok(LinkLockGuard {
            lock: self,
            released: false,
        })
    }
}
