//! Addressable configuration keys for `config get|set|list`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{parse_bool, parse_secs};
use super::{ConfigError, ConfigFile};

/// A `section.key` pair in `config.ini`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    GeneralPreferPrerelease,
    CatalogUrl,
    NetworkTimeoutSecs,
    NetworkUserAgent,
    StorageStagingDir,
    StorageLogDir,
}

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::GeneralPreferPrerelease,
            Self::CatalogUrl,
            Self::NetworkTimeoutSecs,
            Self::NetworkUserAgent,
            Self::StorageStagingDir,
            Self::StorageLogDir,
        ]
    }

    /// INI section name.
    pub fn section(&self) -> &'static str {
        match self {
            Self::GeneralPreferPrerelease => "general",
            Self::CatalogUrl => "catalog",
            Self::NetworkTimeoutSecs | Self::NetworkUserAgent => "network",
            Self::StorageStagingDir | Self::StorageLogDir => "storage",
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            Self::GeneralPreferPrerelease => "prefer_prerelease",
            Self::CatalogUrl => "url",
            Self::NetworkTimeoutSecs => "timeout_secs",
            Self::NetworkUserAgent => "user_agent",
            Self::StorageStagingDir => "staging_dir",
            Self::StorageLogDir => "log_dir",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; unset optional values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::GeneralPreferPrerelease => config.general.prefer_prerelease.to_string(),
            Self::CatalogUrl => config.catalog.url.clone().unwrap_or_default(),
            Self::NetworkTimeoutSecs => config.network.timeout_secs.to_string(),
            Self::NetworkUserAgent => config.network.user_agent.clone(),
            Self::StorageStagingDir => display_path(&config.storage.staging_dir),
            Self::StorageLogDir => display_path(&config.storage.log_dir),
        }
    }

    /// Parse and store a value. An empty value clears optional keys.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let name = self.name();
        match self {
            Self::GeneralPreferPrerelease => {
                config.general.prefer_prerelease = parse_bool(&name, value)?;
            }
            Self::CatalogUrl => config.catalog.url = optional(value),
            Self::NetworkTimeoutSecs => {
                config.network.timeout_secs = parse_secs(&name, value)?;
            }
            Self::NetworkUserAgent => {
                if value.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: name,
                        value: value.to_string(),
                        reason: "user agent cannot be empty".to_string(),
                    });
                }
                config.network.user_agent = value.to_string();
            }
            Self::StorageStagingDir => {
                config.storage.staging_dir = optional(value).map(PathBuf::from);
            }
            Self::StorageLogDir => config.storage.log_dir = optional(value).map(PathBuf::from),
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}
