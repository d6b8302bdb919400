use crate::clock::{Clock, ManualClock};
use crate::config::LockConfig;
use crate::locks::LinkLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// An isolated lock directory plus a shared manual clock.
pub(crate) struct TestLocks {
    pub(crate) dir: TempDir,
    pub(crate) config: LockConfig,
    pub(crate) clock: Arc<ManualClock>,
}

impl TestLocks {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = LockConfig::in_dir(dir.path().join("locks"));
        Self {
            dir,
            config,
            clock: Arc::new(ManualClock::starting_now()),
        }
    }

    pub(crate) fn lock_dir(&self) -> &Path {
        &self.config.lock_dir
    }

    /// A new lock instance on `target` using the manual clock.
    pub(crate) fn lock(&self, target: &str) -> LinkLock {
        self.lock_with_clock(target, self.clock.clone())
    }

    pub(crate) fn lock_with_clock(&self, target: &str, clock: Arc<dyn Clock>) -> LinkLock {
        LinkLock::with_clock(target, &self.config, clock).unwrap()
    }

    /// Files in the lock directory with the given extension.
    pub(crate) fn files_with_extension(&self, extension: &str) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.lock_dir()) else {
            return Vec::new();
        };
        entries
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
            .collect()
    }
}
