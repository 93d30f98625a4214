//! Installed-version log stored on each volume.
//!
//! The log lives at `<volume-root>/empusa.log`:
//!
//! ```json
//! {
//!   "resources": [
//!     { "name": "hekate", "version": "v6.2.0", "updatedAt": "2024-05-01T10:00:00Z" }
//!   ]
//! }
//! ```
//!
//! Logs written by earlier clients use `resource` instead of `name` and store
//! `updatedAt` as seconds since 2001-01-01T00:00:00Z; both are accepted.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{ManagerError, ManagerResult};

/// Log file name at the volume root.
pub const FILE_NAME: &str = "empusa.log";

/// Last installed version of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledResource {
    #[serde(alias = "resource")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Default, Serialize, Deserialize)]
struct LogFile {
    #[serde(default)]
    resources: Vec<InstalledResource>,
}

/// In-memory install log, one entry per resource name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallLog {
    entries: BTreeMap<String, InstalledResource>,
}

impl InstallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the log file on a volume.
    pub fn path_for(volume_root: &Path) -> PathBuf {
        volume_root.join(FILE_NAME)
    }

    /// Load the log of a volume.
    ///
    /// A missing or unreadable log yields an empty one.
    pub fn load(volume_root: &Path) -> Self {
        let path = Self::path_for(volume_root);

        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No install log yet");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read install log, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_slice::<LogFile>(&contents) {
            Ok(file) => {
                let mut log = Self::new();
                for entry in file.resources {
                    log.insert(entry);
                }
                log
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Install log is corrupt, starting empty");
                Self::new()
            }
        }
    }

    /// Write the log to a volume.
    ///
    /// The file is replaced atomically where the filesystem allows it.
    pub fn save(&self, volume_root: &Path) -> ManagerResult<()> {
        let path = Self::path_for(volume_root);
        let tmp_path = volume_root.join(format!("{}.tmp", FILE_NAME));

        let file = LogFile {
            resources: self.entries.values().cloned().collect(),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|e| {
            ManagerError::write(&path, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        fs::write(&tmp_path, json).map_err(|e| ManagerError::write(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| ManagerError::MoveFailed {
            from: tmp_path.clone(),
            to: path.clone(),
            source: e,
        })?;

        debug!(path = %path.display(), entries = self.entries.len(), "Saved install log");
        Ok(())
    }

    /// Record an installation now, replacing any previous entry.
    pub fn add(&mut self, name: impl Into<String>, version: Option<String>) {
        self.add_at(name, version, Utc::now());
    }

    /// Record an installation at a given time, replacing any previous entry.
    pub fn add_at(&mut self, name: impl Into<String>, version: Option<String>, at: DateTime<Utc>) {
        self.insert(InstalledResource {
            name: name.into(),
            version,
            updated_at: at,
        });
    }

    fn insert(&mut self, entry: InstalledResource) {
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Last installed version of a resource.
    ///
    /// `None` both when the resource was never installed and when it was
    /// installed without a known version; use [`InstallLog::entry`] to tell
    /// them apart.
    pub fn installed_version(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|e| e.version.as_deref())
    }

    /// Entry of a resource.
    pub fn entry(&self, name: &str) -> Option<&InstalledResource> {
        self.entries.get(name)
    }

    /// Whether the resource has been installed.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entries ordered by name.
    pub fn entries(&self) -> impl Iterator<Item = &InstalledResource> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// RFC 3339 on write; RFC 3339 or seconds since 2001-01-01 on read.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// 2001-01-01T00:00:00Z as a Unix timestamp.
    const REFERENCE_EPOCH: i64 = 978_307_200;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(f64),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(D::Error::custom),
            Raw::Seconds(seconds) => {
                if !seconds.is_finite() {
                    return Err(D::Error::custom("timestamp is not finite"));
                }
                let whole = seconds.floor();
                let nanos = ((seconds - whole) * 1e9) as u32;
                REFERENCE_EPOCH
                    .checked_add(whole as i64)
                    .and_then(|secs| DateTime::from_timestamp(secs, nanos))
                    .ok_or_else(|| D::Error::custom("timestamp out of range"))
            }
        }
    }
}
