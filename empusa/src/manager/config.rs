//! Configuration for the content manager.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

/// Configuration for the content manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Directory for downloads and extraction.
    ///
    /// Assets are removed from here as soon as they are installed.
    pub staging_dir: PathBuf,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// `User-Agent` header for release API and asset requests.
    pub user_agent: String,

    /// Install pre-release descriptors when a resource declares one.
    pub prefer_prerelease: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir().join("empusa"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            prefer_prerelease: false,
        }
    }
}

impl ManagerConfig {
    /// Create a configuration with the given staging directory.
    pub fn new(staging_dir: PathBuf) -> Self {
        Self {
            staging_dir,
            ..Default::default()
        }
    }

    /// Set the staging directory.
    pub fn with_staging_dir(mut self, path: PathBuf) -> Self {
        self.staging_dir = path;
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Prefer pre-release versions.
    pub fn with_prefer_prerelease(mut self, prefer: bool) -> Self {
        self.prefer_prerelease = prefer;
        self
    }
}
