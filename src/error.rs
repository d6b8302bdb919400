//! Error types for linklock.
//!
//! Uses thiserror for derive macros. Each lock failure kind is its own
//! variant so callers can implement retry/backoff policy by matching,
//! not by parsing messages.

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// The private unique marker could not be created.
    #[error("failed to create {}: {source}", .path.display())]
    LockFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A non-blocking acquisition found the target held by another contender.
    #[error("{} is already locked", .0.display())]
    AlreadyLocked(PathBuf),

    /// A blocking acquisition exceeded its deadline while contended.
    #[error("timeout waiting to acquire lock for {}", .0.display())]
    Timeout(PathBuf),

    /// Release attempted while the target is not locked.
    #[error("{} is not locked", .0.display())]
    NotLocked(PathBuf),

    /// Release attempted by an instance that is not the recorded holder.
    #[error("{} is locked, but not by me", .0.display())]
    NotMyLock(PathBuf),

    /// Filesystem failure while mutating lock state.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration or arguments.
    #[error("{0}")]
    Config(String),
}

impl LockError {
    /// Wrap a filesystem error with what was being attempted.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        LockError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the CLI exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            LockError::LockFailed { .. } => exit_codes::LOCK_FAILED,
            LockError::AlreadyLocked(_) => exit_codes::ALREADY_LOCKED,
            LockError::Timeout(_) => exit_codes::TIMEOUT,
            LockError::NotLocked(_) => exit_codes::NOT_LOCKED,
            LockError::NotMyLock(_) => exit_codes::NOT_MY_LOCK,
            LockError::Io { .. } => exit_codes::IO_FAILURE,
            LockError::Config(_) => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_failed_has_correct_exit_code() {
        let err = LockError::LockFailed {
            path: PathBuf::from("/tmp/x.marker"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILED);
        assert!(err.to_string().starts_with("failed to create /tmp/x.marker"));
    }

    #[test]
    fn contention_errors_have_distinct_exit_codes() {
        let already = LockError::AlreadyLocked(PathBuf::from("/data/x"));
        let timeout = LockError::Timeout(PathBuf::from("/data/x"));
        assert_eq!(already.exit_code(), exit_codes::ALREADY_LOCKED);
        assert_eq!(timeout.exit_code(), exit_codes::TIMEOUT);
        assert_ne!(already.exit_code(), timeout.exit_code());
    }

    #[test]
    fn release_errors_have_correct_exit_codes() {
        assert_eq!(
            LockError::NotLocked(PathBuf::from("/data/x")).exit_code(),
            exit_codes::NOT_LOCKED
        );
        assert_eq!(
            LockError::NotMyLock(PathBuf::from("/data/x")).exit_code(),
            exit_codes::NOT_MY_LOCK
        );
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = LockError::AlreadyLocked(PathBuf::from("/data/x"));
        assert_eq!(err.to_string(), "/data/x is already locked");

        let err = LockError::NotMyLock(PathBuf::from("/data/x"));
        assert_eq!(err.to_string(), "/data/x is locked, but not by me");

        let err = LockError::io("failed to remove lock", io::Error::other("busy"));
        assert_eq!(err.to_string(), "failed to remove lock: busy");
        assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
    }
}
