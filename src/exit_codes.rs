//! Exit code constants for the linklock CLI.
//!
//! Every lock failure kind gets its own code so shell callers can branch
//! on the outcome the same way library callers match on `LockError`:
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Filesystem failure while mutating lock state
//! - 3: Marker file could not be created
//! - 4: Lock already held (non-blocking attempt)
//! - 5: Timed out waiting for the lock
//! - 6: Release attempted on an unlocked target
//! - 7: Release attempted by a non-holder

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// Unexpected filesystem failure (link, unlink, payload write).
pub const IO_FAILURE: i32 = 2;

/// The private unique marker could not be created.
pub const LOCK_FAILED: i32 = 3;

/// A non-blocking acquisition found the target held by someone else.
pub const ALREADY_LOCKED: i32 = 4;

/// A blocking acquisition exceeded its deadline.
pub const TIMEOUT: i32 = 5;

/// Release attempted while nobody holds the lock.
pub const NOT_LOCKED: i32 = 6;

/// Release attempted by an instance that is not the holder.
pub const NOT_MY_LOCK: i32 = 7;
