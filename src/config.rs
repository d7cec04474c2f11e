//! SDK configuration.
//!
//! Settings are passed explicitly to the objects that need them; nothing is
//! read from process-wide state. A config can be built in code or loaded from
//! TOML:
//!
//! ```
//! use archivelib::SdkConfig;
//!
//! let config = SdkConfig::from_toml_str(r#"
//!     request_timeout_secs = 30
//!     job_polling_interval_ms = 500
//! "#).unwrap();
//! assert_eq!(config.request_timeout_secs, 30);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ArchiveError, Result};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_JOB_POLLING_INTERVAL_MS: u64 = 1000;

/// Configuration shared by every client the SDK creates.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SdkConfig {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Optional proxy URL (e.g. "http://proxy:8080").
    pub proxy: Option<String>,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Interval between restore-job status checks.
    pub job_polling_interval_ms: u64,
    /// Give up waiting for a restore job after this many seconds. Unset waits forever.
    pub job_max_wait_secs: Option<u64>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            proxy: None,
            user_agent: format!("archivelib/{}", env!("CARGO_PKG_VERSION")),
            job_polling_interval_ms: DEFAULT_JOB_POLLING_INTERVAL_MS,
            job_max_wait_secs: None,
        }
    }
}

impl SdkConfig {
    /// Parse a config from a TOML string. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ArchiveError::ConfigError(e.to_string()))
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_job_polling_interval(mut self, interval: Duration) -> Self {
        self.job_polling_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_job_max_wait(mut self, max_wait: Duration) -> Self {
        self.job_max_wait_secs = Some(max_wait.as_secs());
        self
    }

    pub fn job_polling_interval(&self) -> Duration {
        Duration::from_millis(self.job_polling_interval_ms)
    }

    pub fn job_max_wait(&self) -> Option<Duration> {
        self.job_max_wait_secs.map(Duration::from_secs)
    }
}
