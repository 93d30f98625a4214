//! Where a release's asset comes from.

use serde::{Deserialize, Serialize};

/// Base URL of the GitHub REST API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Source of a release asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReleaseSource {
    /// Latest release of a repository on a GitHub-compatible forge.
    ///
    /// The version is only known after querying the release API.
    HostedRepo(HostedRepo),

    /// A fixed download URL with a statically known (or absent) version.
    DirectLink { url: String, version: Option<String> },
}

impl ReleaseSource {
    /// Create a direct-link source.
    pub fn direct(url: impl Into<String>, version: Option<&str>) -> Self {
        Self::DirectLink {
            url: url.into(),
            version: version.map(str::to_string),
        }
    }

    /// Version known without any network request.
    pub fn static_version(&self) -> Option<&str> {
        match self {
            Self::HostedRepo(_) => None,
            Self::DirectLink { version, .. } => version.as_deref(),
        }
    }
}

/// A repository on GitHub or on a forge exposing the same releases API
/// (Gitea and Forgejo serve it under `/api/v1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostedRepo {
    /// API root, e.g. `https://api.github.com`.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Repository owner.
    pub owner: String,

    /// Repository name.
    pub repo: String,

    /// The first release asset whose name starts with this prefix is used.
    pub asset_prefix: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl HostedRepo {
    /// Create a GitHub repository source.
    pub fn github(
        owner: impl Into<String>,
        repo: impl Into<String>,
        asset_prefix: impl Into<String>,
    ) -> Self {
        Self {
            api_base: default_api_base(),
            owner: owner.into(),
            repo: repo.into(),
            asset_prefix: asset_prefix.into(),
        }
    }

    /// Use a different API root (self-hosted forges).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// URL returning the most recent published release.
    pub fn latest_release_url(&self) -> String {
        format!("{}/releases/latest", self.repo_url())
    }

    /// URL returning all releases, newest first.
    pub fn releases_url(&self) -> String {
        format!("{}/releases", self.repo_url())
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}
