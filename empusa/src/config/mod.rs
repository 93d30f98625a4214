//! User configuration.
//!
//! Settings live in `~/.empusa/config.ini`:
//!
//! ```ini
//! [general]
//! prefer_prerelease = false
//!
//! [catalog]
//! url =
//!
//! [network]
//! timeout_secs = 300
//! user_agent = empusa/0.4.0
//!
//! [storage]
//! staging_dir =
//! log_dir =
//! ```
//!
//! Empty values fall back to defaults. CLI arguments override config values.

mod file;
mod keys;

pub use file::{
    config_dir, config_file_path, CatalogSettings, ConfigFile, GeneralSettings,
    NetworkSettings, StorageSettings, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
pub use keys::ConfigKey;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid INI.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// A value has the wrong type.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The key is not a known `section.key` pair.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    const TB: u64 = 1024 * GB;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
