//! linklock: cross-process file locking built on the atomicity of `link(2)`.
//!
//! A [`LinkLock`] protects a target path. Contenders in any process that use
//! the same lock directory compute the same shared indicator path; exactly
//! one of them can hard-link its private marker onto it.
//!
//! ```no_run
//! use linklock::{LinkLock, LockConfig, Wait};
//! use std::time::Duration;
//!
//! let config = LockConfig::in_dir("/tmp/myapp-locks");
//! let mut lock = LinkLock::new("/data/x", &config)?;
//!
//! let guard = lock.lock(Some(Wait::For(Duration::from_secs(5))), None)?;
//! // ... critical section ...
//! guard.release()?;
//! # Ok::<(), linklock::LockError>(())
//! ```
//!
//! ## Modules
//! - `locks`: The link lock engine, identity, payload and guard
//! - `config`: Lock directory, default timeout/expiration, retry cadence
//! - `clock`: Injectable time source for the retry loop
//! - `error`: Error kinds callers branch on

#[cfg(not(unix))]
compile_error!("linklock relies on hard link counts and inode identity and supports Unix only");

pub mod clock;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod locks;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LockConfig, ThreadingMode};
pub use error::{LockError, Result};
pub use locks::{LinkLock, LinkLockGuard, LockIdentity, LockPayload, LockStatus, RetryPolicy, Wait};
