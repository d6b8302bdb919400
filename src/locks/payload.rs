//! Lock indicator payload.
//!
//! The indicator is a hard link to the holder's marker, so both names share
//! one inode and one content. The content is a small JSON document:
//!
//! ```text
//! {
//!   "pid": 4242,
//!   "expires_in": 30.0,
//!   "acquired_at": "2026-10-18T09:30:00Z"
//! }
//! ```
//!
//! Readers are lenient: anything that does not parse reads as an empty
//! payload, which never expires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::time::Duration;

/// Parsed lock payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPayload {
    /// Process id of the instance that created the marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Lifetime after which the lock may be reclaimed, in seconds. Never zero.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "secs")]
    pub expires_in: Option<Duration>,

    /// When the holder linked the indicator. Absent on an unlinked marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquired_at: Option<DateTime<Utc>>,
}

impl LockPayload {
    /// Payload for the current process with an optional expiration.
    pub fn for_current_process(expires_in: Duration) -> Self {
        Self {
            pid: Some(std::process::id()),
            expires_in: (!expires_in.is_zero()).then_some(expires_in),
            acquired_at: None,
        }
    }

    /// Stamp the acquisition time.
    pub fn acquired_at(mut self, at: DateTime<Utc>) -> Self {
        self.acquired_at = Some(at);
        self
    }

    /// Parse payload text, falling back to an empty payload.
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    /// Serialize the payload to a JSON string.
    pub fn to_json(&self) -> io::Result<String> {
        serde_json::to_string_pretty(self).map_err(io::Error::from)
    }
}

/// `Option<Duration>` as fractional seconds. Zero, negative and
/// out-of-range values read as `None`.
mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(deserializer)?;
        Ok(secs
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .filter(|d| !d.is_zero()))
    }
}
