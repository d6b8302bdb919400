//! Lock identity: which files a lock instance uses.
//!
//! # Layout
//!
//! Both files live in the configured lock directory:
//!
//! - Shared indicator: `<lock_dir>/<sha256 of absolute target>.lock`. Every
//!   process computes the same name for the same target.
//! - Unique marker: `<lock_dir>/<host>-[<thread>-]<pid>-<seq>.marker`, where
//!   `seq` is a per-process instance counter, so two instances never share a
//!   marker even inside one process.

use crate::config::{LockConfig, ThreadingMode};
use crate::error::{LockError, Result};
use crate::locks::Wait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

/// Paths and defaults for one lock instance.
#[derive(Debug, Clone)]
pub struct LockIdentity {
    target_path: PathBuf,
    unique_marker_path: PathBuf,
    shared_indicator_path: PathBuf,
    default_timeout: Wait,
    default_expires_in: Duration,
    threading_mode: ThreadingMode,
}

impl LockIdentity {
    /// Resolve the identity for `target` under `config`.
    pub fn resolve<P: AsRef<Path>>(target: P, config: &LockConfig) -> Result<Self> {
        config.validate()?;

        let target_path = std::path::absolute(target.as_ref()).map_err(|e| {
            LockError::Config(format!(
                "failed to resolve target path '{}': {}",
                target.as_ref().display(),
                e
            ))
        })?;

        let shared_indicator_path = config.lock_dir.join(indicator_file_name(&target_path));
        let unique_marker_path = config.lock_dir.join(marker_file_name(config.threading));

        Ok(Self {
            target_path,
            unique_marker_path,
            shared_indicator_path,
            default_timeout: config.default_wait(),
            default_expires_in: config.expires_in(),
            threading_mode: config.threading,
        })
    }

    /// Build an identity from explicit paths.
    ///
    /// The marker and indicator must be on the same filesystem.
    pub fn new(
        target_path: PathBuf,
        unique_marker_path: PathBuf,
        shared_indicator_path: PathBuf,
    ) -> Self {
        Self {
            target_path,
            unique_marker_path,
            shared_indicator_path,
            default_timeout: Wait::Forever,
            default_expires_in: Duration::ZERO,
            threading_mode: ThreadingMode::Process,
        }
    }

    /// Override the timeout used when `acquire` is given none.
    pub fn with_default_timeout(mut self, wait: Wait) -> Self {
        self.default_timeout = wait;
        self
    }

    /// Override the expiration used when `acquire` is given none.
    pub fn with_default_expires_in(mut self, expires_in: Duration) -> Self {
        self.default_expires_in = expires_in;
        self
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn unique_marker_path(&self) -> &Path {
        &self.unique_marker_path
    }

    pub fn shared_indicator_path(&self) -> &Path {
        &self.shared_indicator_path
    }

    pub fn default_timeout(&self) -> Wait {
        self.default_timeout
    }

    pub fn default_expires_in(&self) -> Duration {
        self.default_expires_in
    }

    pub fn threading_mode(&self) -> ThreadingMode {
        self.threading_mode
    }
}

/// Indicator file name for an absolute target path.
pub fn indicator_file_name(target: &Path) -> String {
    let digest = Sha256::digest(target.as_os_str().as_encoded_bytes());
    format!("{:x}.lock", digest)
}

fn marker_file_name(mode: ThreadingMode) -> String {
    let seq = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();
    let host = host_label();

    match mode {
        ThreadingMode::Process => format!("{}-{}-{}.marker", host, pid, seq),
        ThreadingMode::Threaded => {
            format!("{}-{}-{}-{}.marker", host, thread_label(), pid, seq)
        }
    }
}

/// Hostname restricted to characters that are safe in a file name.
fn host_label() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    host.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Numeric part of the current thread's id, as `t<N>`.
fn thread_label() -> String {
    let id = format!("{:?}", std::thread::current().id());
    let digits: String = id.chars().filter(char::is_ascii_digit).collect();
    format!("t{}", digits)
}
