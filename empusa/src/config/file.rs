//! Loading and saving `config.ini`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use super::ConfigError;
use crate::manager::ManagerConfig;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default `User-Agent` sent with every request.
///
/// The GitHub API rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = concat!("empusa/", env!("CARGO_PKG_VERSION"));

const CONFIG_DIR_NAME: &str = ".empusa";
const CONFIG_FILE_NAME: &str = "config.ini";

/// `[general]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralSettings {
    /// Install pre-release versions when a resource offers one.
    pub prefer_prerelease: bool,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Remote catalog URL; the built-in catalog is used when unset.
    pub url: Option<String>,
}

/// `[network]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    /// Where assets are downloaded and extracted before installation.
    pub staging_dir: Option<PathBuf>,

    /// Where the application log is written.
    pub log_dir: Option<PathBuf>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub general: GeneralSettings,
    pub catalog: CatalogSettings,
    pub network: NetworkSettings,
    pub storage: StorageSettings,
}

/// Directory holding the configuration file and application logs.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME))
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

impl ConfigFile {
    /// Load the configuration from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load the configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();

        if let Some(value) = get(&ini, "general", "prefer_prerelease") {
            config.general.prefer_prerelease = parse_bool("general.prefer_prerelease", value)?;
        }

        config.catalog.url = get(&ini, "catalog", "url").map(str::to_string);

        if let Some(value) = get(&ini, "network", "timeout_secs") {
            config.network.timeout_secs = parse_secs("network.timeout_secs", value)?;
        }
        if let Some(value) = get(&ini, "network", "user_agent") {
            config.network.user_agent = value.to_string();
        }

        config.storage.staging_dir = get(&ini, "storage", "staging_dir").map(PathBuf::from);
        config.storage.log_dir = get(&ini, "storage", "log_dir").map(PathBuf::from);

        Ok(config)
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save the configuration to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("general")).set(
            "prefer_prerelease",
            self.general.prefer_prerelease.to_string(),
        );
        ini.with_section(Some("catalog"))
            .set("url", self.catalog.url.clone().unwrap_or_default());
        ini.with_section(Some("network"))
            .set("timeout_secs", self.network.timeout_secs.to_string())
            .set("user_agent", self.network.user_agent.clone());
        ini.with_section(Some("storage"))
            .set("staging_dir", path_value(&self.storage.staging_dir))
            .set("log_dir", path_value(&self.storage.log_dir));

        ini.write_to_file(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Staging directory, defaulting to `<tmp>/empusa`.
    pub fn staging_dir(&self) -> PathBuf {
        self.storage
            .staging_dir
            .clone()
            .unwrap_or_else(|| env::temp_dir().join("empusa"))
    }

    /// Log directory, defaulting to `~/.empusa/logs`.
    pub fn log_dir(&self) -> PathBuf {
        self.storage
            .log_dir
            .clone()
            .unwrap_or_else(|| config_dir().join("logs"))
    }

    /// Build the manager configuration from these settings.
    pub fn to_manager_config(&self) -> ManagerConfig {
        ManagerConfig::new(self.staging_dir())
            .with_timeout(Duration::from_secs(self.network.timeout_secs))
            .with_user_agent(self.network.user_agent.clone())
            .with_prefer_prerelease(self.general.prefer_prerelease)
    }
}

/// Read a value, treating empty strings as unset.
fn get<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section))
        .and_then(|s| s.get(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn path_value(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

pub(super) fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

pub(super) fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a positive number of seconds".to_string(),
        })
}
