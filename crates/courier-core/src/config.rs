//! Service configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Tunables for dispatch, scheduling and folder queries.
///
/// Every field has a default, so a partial (or empty) JSON document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Addresses must be strictly shorter than this many bytes.
    pub max_email_len: usize,
    /// Messages scheduled further than this into the future are deferred.
    pub schedule_grace_secs: u64,
    /// Largest accepted `limit` for a folder query.
    pub max_page_size: usize,
    /// Largest accepted `page` for a folder query.
    pub max_page: usize,
    /// Tick period of the scheduled-release loop.
    pub release_interval_ms: u64,
    /// Account seeded when the daemon starts.
    pub admin_email: String,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            max_email_len: 80,
            schedule_grace_secs: 10,
            max_page_size: 100,
            max_page: 1000,
            release_interval_ms: 1000,
            admin_email: "admin@localhost".to_string(),
        }
    }
}

impl CourierConfig {
    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Grace window as a `chrono` duration.
    #[must_use]
    pub fn schedule_grace(&self) -> chrono::Duration {
        i64::try_from(self.schedule_grace_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Release loop period.
    #[must_use]
    pub const fn release_interval(&self) -> Duration {
        Duration::from_millis(self.release_interval_ms)
    }
}
