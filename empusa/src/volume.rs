//! Destination volumes.
//!
//! Discovering removable volumes is left to the host platform; the core only
//! needs the root path of an already mounted volume and a stable identifier.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::config::format_size;
use crate::manager::{ManagerError, ManagerResult};

/// A mounted destination volume.
///
/// Volumes compare by `id` only. The [`Volume::none`] sentinel has an empty
/// id, which no real volume may use, so it is equal only to itself.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Stable identifier (filesystem UUID or canonical mount path).
    pub id: String,

    /// Volume label.
    pub name: String,

    /// Mount point; the volume root.
    pub path: PathBuf,

    /// Total capacity in bytes (0 when unknown).
    pub capacity: u64,
}

impl Volume {
    /// Create a volume.
    ///
    /// An empty `id` is reserved for [`Volume::none`]; the mount path is used
    /// as identifier instead.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        capacity: u64,
    ) -> Self {
        let path = path.into();
        let mut id = id.into();
        if id.is_empty() {
            id = path.display().to_string();
        }
        Self {
            id,
            name: name.into(),
            path,
            capacity,
        }
    }

    /// The "no volume selected" sentinel.
    pub fn none() -> Self {
        Self {
            id: String::new(),
            name: "None".to_string(),
            path: PathBuf::new(),
            capacity: 0,
        }
    }

    /// Build a volume for a mounted directory.
    ///
    /// The canonical path doubles as identifier and the last path component
    /// as name.
    pub fn from_path(path: impl AsRef<Path>) -> ManagerResult<Self> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .map_err(|e| ManagerError::read(path, e))?;

        if !canonical.is_dir() {
            return Err(ManagerError::InvalidPath(format!(
                "{} is not a directory",
                canonical.display()
            )));
        }

        let name = canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| canonical.display().to_string());
        let capacity = total_capacity(&canonical);

        Ok(Self::new(
            canonical.display().to_string(),
            name,
            canonical,
            capacity,
        ))
    }

    /// Whether this is the "no volume selected" sentinel.
    pub fn is_none(&self) -> bool {
        self.id.is_empty()
    }

    /// Root directory of the volume.
    pub fn root(&self) -> &Path {
        &self.path
    }

    /// Capacity formatted for display.
    pub fn formatted_capacity(&self) -> String {
        format_size(self.capacity)
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::none()
    }
}

impl PartialEq for Volume {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Volume {}

impl Hash for Volume {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(unix)]
fn total_capacity(path: &Path) -> u64 {
    nix::sys::statvfs::statvfs(path)
        .map(|stat| (stat.blocks() as u64).saturating_mul(stat.fragment_size() as u64))
        .unwrap_or(0)
}

#[cfg(not(unix))]
fn total_capacity(_path: &Path) -> u64 {
    0
}
