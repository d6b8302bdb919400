//! Link-based locking.
//!
//! This module implements a cross-process mutex on a target path using the
//! filesystem as the only arbiter.
//!
//! # Protocol
//!
//! Each lock instance creates a private unique marker file. To acquire, it
//! hard-links the marker onto the shared indicator for the target. `link(2)`
//! is atomic and fails with `EEXIST` when the indicator already exists, so
//! concurrent contenders cannot both succeed. Everything around that one
//! call (link counts, expiration, existence checks) is a best-effort
//! heuristic and may race with concurrent cleanup; `release` therefore
//! re-verifies identity instead of trusting an earlier `is_locked`.
//!
//! # Identity
//!
//! While an instance holds the lock, its marker has link count 2 and shares
//! an inode with the indicator.
//!
//! # Expiration
//!
//! A holder may persist an expiration in the indicator payload. Once the
//! indicator's age exceeds it, any contender treats the lock as abandoned
//! and deletes it. Reads such as `is_locked` perform that cleanup too.

mod guard;
mod identity;
mod inspect;
mod link_lock;
mod payload;
mod types;


// Re-export public API
pub use guard::LinkLockGuard;
pub use identity::{LockIdentity, indicator_file_name};
pub use link_lock::LinkLock;
pub use payload::LockPayload;
pub use types::{LockStatus, RetryPolicy, Wait};
