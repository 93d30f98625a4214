//! Resource and release descriptors.

use serde::{Deserialize, Serialize};

use super::source::{HostedRepo, ReleaseSource};
use super::step::InstallStep;

/// File type that is extracted before installation.
const ARCHIVE_FILE_TYPE: &str = "zip";

/// A supported software package.
///
/// # Example
///
/// ```
/// use empusa::resource::{InstallStep, ReleaseDescriptor, ReleaseSource, ResourceDefinition};
///
/// let release = ReleaseDescriptor::new(
///     ReleaseSource::direct("https://example.com/bootlogos.zip", None),
///     "bootlogos.zip",
///     vec![InstallStep::merge_dir("bootloader", "bootloader")],
/// );
/// let resource = ResourceDefinition::new("bootLogos", "Boot logos", release);
///
/// assert_eq!(resource.formatted_name(), "Boot logos");
/// assert!(resource.release(true).is_archive());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Stable identifier, also the key in the install log.
    pub name: String,

    /// Human readable name.
    pub display_name: String,

    /// Extra qualifier shown after the display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_description: Option<String>,

    /// Release installed by default.
    pub stable_release: ReleaseDescriptor,

    /// Release installed when pre-release versions are preferred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_release: Option<ReleaseDescriptor>,
}

impl ResourceDefinition {
    /// Create a resource with only a stable release.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        stable_release: ReleaseDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            additional_description: None,
            stable_release,
            pre_release: None,
        }
    }

    /// Set the pre-release descriptor.
    pub fn with_pre_release(mut self, release: ReleaseDescriptor) -> Self {
        self.pre_release = Some(release);
        self
    }

    /// Set the additional description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.additional_description = Some(description.into());
        self
    }

    /// Display name followed by the additional description, if any.
    pub fn formatted_name(&self) -> String {
        match &self.additional_description {
            Some(description) => format!("{} {}", self.display_name, description),
            None => self.display_name.clone(),
        }
    }

    /// The release to install for the given preference.
    ///
    /// Falls back to the stable release when no pre-release is declared.
    pub fn release(&self, prefer_prerelease: bool) -> &ReleaseDescriptor {
        match (&self.pre_release, prefer_prerelease) {
            (Some(pre_release), true) => pre_release,
            _ => &self.stable_release,
        }
    }
}

/// A releasable artifact and how to install it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawReleaseDescriptor", into = "RawReleaseDescriptor")]
pub struct ReleaseDescriptor {
    /// Where the asset is downloaded from.
    pub source: ReleaseSource,

    /// File name the downloaded asset is saved under.
    pub asset_filename: String,

    /// Ordered install procedure.
    pub install_steps: Vec<InstallStep>,
}

impl ReleaseDescriptor {
    /// Create a release descriptor.
    pub fn new(
        source: ReleaseSource,
        asset_filename: impl Into<String>,
        install_steps: Vec<InstallStep>,
    ) -> Self {
        Self {
            source,
            asset_filename: asset_filename.into(),
            install_steps,
        }
    }

    /// Statically declared version, if any.
    pub fn version(&self) -> Option<&str> {
        self.source.static_version()
    }

    /// Extension of the asset file name (text after the last `.`).
    pub fn file_type(&self) -> &str {
        self.asset_filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("")
    }

    /// Whether the asset must be decompressed before installation.
    pub fn is_archive(&self) -> bool {
        self.file_type().eq_ignore_ascii_case(ARCHIVE_FILE_TYPE)
    }

    /// Asset file name without its extension.
    pub fn asset_stem(&self) -> &str {
        self.asset_filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(&self.asset_filename)
    }
}

/// Catalog wire shape: either `asset_url` (+ optional `version`) or
/// `repository`.
#[derive(Serialize, Deserialize)]
struct RawReleaseDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    asset_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repository: Option<HostedRepo>,
    asset_filename: String,
    #[serde(default)]
    install_steps: Vec<InstallStep>,
}

impl TryFrom<RawReleaseDescriptor> for ReleaseDescriptor {
    type Error = String;

    fn try_from(raw: RawReleaseDescriptor) -> Result<Self, Self::Error> {
        if raw.asset_filename.is_empty()
            || raw.asset_filename.contains('/')
            || raw.asset_filename.contains('\\')
            || raw.asset_filename == ".."
        {
            return Err(format!(
                "asset_filename '{}' must be a plain file name",
                raw.asset_filename
            ));
        }

        let source = match (raw.asset_url, raw.repository) {
            (Some(url), None) => ReleaseSource::DirectLink {
                url,
                version: raw.version,
            },
            (None, Some(repository)) => {
                if raw.version.is_some() {
                    return Err(
                        "version is resolved from the repository and cannot be declared"
                            .to_string(),
                    );
                }
                ReleaseSource::HostedRepo(repository)
            }
            (Some(_), Some(_)) => {
                return Err("asset_url and repository are mutually exclusive".to_string())
            }
            (None, None) => return Err("either asset_url or repository is required".to_string()),
        };

        Ok(Self {
            source,
            asset_filename: raw.asset_filename,
            install_steps: raw.install_steps,
        })
    }
}

impl From<ReleaseDescriptor> for RawReleaseDescriptor {
    fn from(release: ReleaseDescriptor) -> Self {
        let (version, asset_url, repository) = match release.source {
            ReleaseSource::DirectLink { url, version } => (version, Some(url), None),
            ReleaseSource::HostedRepo(repository) => (None, None, Some(repository)),
        };
        Self {
            version,
            asset_url,
            repository,
            asset_filename: release.asset_filename,
            install_steps: release.install_steps,
        }
    }
}
