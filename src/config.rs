//! Configuration model for linklock.
//!
//! `LockConfig` is everything a lock instance needs beyond its target path:
//! where lock files live, default timeout and expiration, threading mode and
//! retry cadence. It can be built in code or loaded from a YAML file; unknown
//! fields are ignored for forward compatibility and every field has a default.

use crate::error::{LockError, Result};
use crate::locks::{RetryPolicy, Wait};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How unique marker names are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreadingMode {
    /// Marker name derives from host and process (default).
    #[default]
    Process,
    /// Marker name also carries the creating thread's id.
    Threaded,
}

impl ThreadingMode {
    /// Parse a threading mode from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "process" => Some(Self::Process),
            "threaded" => Some(Self::Threaded),
            _ => None,
        }
    }
}

/// Configuration for lock instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Directory holding shared indicators and unique markers.
    ///
    /// Markers and indicators must share a filesystem, since a hard link
    /// cannot cross devices.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,

    /// Default acquisition timeout in seconds.
    ///
    /// Unset blocks forever; zero or negative fails at first contention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,

    /// Default lock expiration in seconds (0 = never expires).
    #[serde(default)]
    pub expires_in_secs: f64,

    /// Marker naming mode.
    #[serde(default)]
    pub threading: ThreadingMode,

    /// Pause between attempts when blocking without a deadline.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Lower bound on the pause between attempts when a deadline is set.
    #[serde(default = "default_min_poll_interval_ms")]
    pub min_poll_interval_ms: u64,
}

/// Default lock directory: `<system temp>/linklock`.
pub fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("linklock")
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_min_poll_interval_ms() -> u64 {
    100
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_dir: default_lock_dir(),
            timeout_secs: None,
            expires_in_secs: 0.0,
            threading: ThreadingMode::default(),
            poll_interval_ms: default_poll_interval_ms(),
            min_poll_interval_ms: default_min_poll_interval_ms(),
        }
    }
}

impl LockConfig {
    /// Default configuration rooted at an explicit lock directory.
    pub fn in_dir<P: Into<PathBuf>>(lock_dir: P) -> Self {
        Self {
            lock_dir: lock_dir.into(),
            ..Self::default()
        }
    }

    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LockConfig = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `lock_dir` must be non-empty
    /// - `timeout_secs` must be finite when set
    /// - `expires_in_secs` must be finite and non-negative
    /// - both poll intervals must be positive
    pub fn validate(&self) -> Result<()> {
        if self.lock_dir.as_os_str().is_empty() {
            return Err(LockError::Config(
                "config validation failed: lock_dir must be non-empty".to_string(),
            ));
        }

        if let Some(timeout) = self.timeout_secs
            && !timeout.is_finite()
        {
            return Err(LockError::Config(
                "config validation failed: timeout_secs must be a finite number".to_string(),
            ));
        }

        if !self.expires_in_secs.is_finite() || self.expires_in_secs < 0.0 {
            return Err(LockError::Config(format!(
                "config validation failed: expires_in_secs must be 0 or greater (found {})",
                self.expires_in_secs
            )));
        }

        if self.poll_interval_ms == 0 {
            return Err(LockError::Config(
                "config validation failed: poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.min_poll_interval_ms == 0 {
            return Err(LockError::Config(
                "config validation failed: min_poll_interval_ms must be greater than 0"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// The default wait policy derived from `timeout_secs`.
    pub fn default_wait(&self) -> Wait {
        Wait::from_secs(self.timeout_secs)
    }

    /// The default expiration; zero means the lock never expires.
    pub fn expires_in(&self) -> Duration {
        Duration::try_from_secs_f64(self.expires_in_secs).unwrap_or_default()
    }

    /// Retry cadence for the acquisition loop.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            min_poll_interval: Duration::from_millis(self.min_poll_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LockConfig::default();

        assert_eq!(config.lock_dir, std::env::temp_dir().join("linklock"));
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.expires_in_secs, 0.0);
        assert_eq!(config.threading, ThreadingMode::Process);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.min_poll_interval_ms, 100);
        assert_eq!(config.default_wait(), Wait::Forever);
        assert_eq!(config.expires_in(), Duration::ZERO);
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let config = LockConfig::from_yaml("").unwrap();

        assert_eq!(config.lock_dir, default_lock_dir());
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
lock_dir: /var/lock/myapp
timeout_secs: 2.5
expires_in_secs: 30
threading: threaded
poll_interval_ms: 250
min_poll_interval_ms: 50
"#;
        let config = LockConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.lock_dir, PathBuf::from("/var/lock/myapp"));
        assert_eq!(config.timeout_secs, Some(2.5));
        assert_eq!(config.threading, ThreadingMode::Threaded);
        assert_eq!(config.default_wait(), Wait::For(Duration::from_millis(2500)));
        assert_eq!(config.expires_in(), Duration::from_secs(30));

        let retry = config.retry_policy();
        assert_eq!(retry.poll_interval, Duration::from_millis(250));
        assert_eq!(retry.min_poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_zero_timeout_means_immediate() {
        let config = LockConfig::from_yaml("timeout_secs: 0").unwrap();
        assert_eq!(config.default_wait(), Wait::Immediate);

        let config = LockConfig::from_yaml("timeout_secs: -3").unwrap();
        assert_eq!(config.default_wait(), Wait::Immediate);
    }

    #[test]
    fn test_parse_yaml_with_unknown_fields() {
        let yaml = r#"
poll_interval_ms: 10
strategy: symlink
future:
  nested: true
"#;
        let config = LockConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.poll_interval_ms, 10);
    }

    #[test]
    fn test_validate_negative_expiration() {
        let result = LockConfig::from_yaml("expires_in_secs: -1");

        let err = result.unwrap_err();
        assert!(matches!(err, LockError::Config(_)));
        assert!(err.to_string().contains("expires_in_secs"));
    }

    #[test]
    fn test_validate_zero_poll_intervals() {
        let err = LockConfig::from_yaml("poll_interval_ms: 0").unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));

        let err = LockConfig::from_yaml("min_poll_interval_ms: 0").unwrap_err();
        assert!(err.to_string().contains("min_poll_interval_ms"));
    }

    #[test]
    fn test_validate_empty_lock_dir() {
        let config = LockConfig::in_dir("");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lock_dir"));
    }

    #[test]
    fn test_threading_mode_from_str() {
        assert_eq!(
            ThreadingMode::from_str("process"),
            Some(ThreadingMode::Process)
        );
        assert_eq!(
            ThreadingMode::from_str("threaded"),
            Some(ThreadingMode::Threaded)
        );
        assert_eq!(ThreadingMode::from_str("fibers"), None);
    }

    #[test]
    fn test_to_yaml_parses_back() {
        let mut config = LockConfig::in_dir("/tmp/locks");
        config.timeout_secs = Some(5.0);
        let yaml = config.to_yaml().unwrap();

        let parsed = LockConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.lock_dir, config.lock_dir);
        assert_eq!(parsed.timeout_secs, Some(5.0));
    }

    #[test]
    fn test_config_load_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "lock_dir: /srv/locks").unwrap();
        writeln!(file, "expires_in_secs: 5").unwrap();

        let config = LockConfig::load(file.path()).unwrap();
        assert_eq!(config.lock_dir, PathBuf::from("/srv/locks"));
        assert_eq!(config.expires_in(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_load_missing_file() {
        let err = LockConfig::load("/nonexistent/path/linklock.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
