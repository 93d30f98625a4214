//! Release metadata resolution.
//!
//! Hosted repositories are queried through a GitHub-compatible release API;
//! direct links carry everything needed and never touch the network.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::error::{ManagerError, ManagerResult};
use super::traits::HttpClient;
use crate::resource::{HostedRepo, ReleaseDescriptor, ReleaseSource};

/// Marker the release API puts in its error message when throttling.
const RATE_LIMIT_MARKER: &str = "rate limit exceeded";

/// A published release as returned by the release API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryRelease {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    #[serde(default)]
    pub prerelease: bool,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    pub browser_download_url: String,
}

/// Error payload of the release API.
#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// Where and which version to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    /// Version recorded in the install log.
    pub version: Option<String>,

    /// URL of the asset to download.
    pub asset_url: String,

    /// Name of the remote asset.
    pub asset_name: String,

    /// Whether the release is flagged as a pre-release.
    pub prerelease: bool,
}

/// Resolves release descriptors to downloadable assets.
pub struct ReleaseResolver<'a, C: HttpClient + ?Sized> {
    client: &'a C,
    prefer_prerelease: bool,
}

impl<'a, C: HttpClient + ?Sized> ReleaseResolver<'a, C> {
    /// Create a resolver.
    ///
    /// With `prefer_prerelease`, hosted repositories resolve to their newest
    /// pre-release when one exists.
    pub fn new(client: &'a C, prefer_prerelease: bool) -> Self {
        Self {
            client,
            prefer_prerelease,
        }
    }

    /// Resolve the current release of a descriptor.
    pub fn resolve(&self, descriptor: &ReleaseDescriptor) -> ManagerResult<ResolvedRelease> {
        match &descriptor.source {
            ReleaseSource::DirectLink { url, version } => Ok(ResolvedRelease {
                version: version.clone(),
                asset_url: url.clone(),
                asset_name: descriptor.asset_filename.clone(),
                prerelease: false,
            }),
            ReleaseSource::HostedRepo(repo) => {
                let release = self.fetch_release(repo)?;
                let asset = select_asset(&release, &repo.asset_prefix)?;

                info!(
                    repo = %format!("{}/{}", repo.owner, repo.repo),
                    tag = %release.tag_name,
                    asset = %asset.name,
                    "Resolved release"
                );

                Ok(ResolvedRelease {
                    version: Some(release.tag_name.clone()),
                    asset_url: asset.browser_download_url.clone(),
                    asset_name: asset.name.clone(),
                    prerelease: release.prerelease,
                })
            }
        }
    }

    fn fetch_release(&self, repo: &HostedRepo) -> ManagerResult<RepositoryRelease> {
        if self.prefer_prerelease {
            let releases: Vec<RepositoryRelease> = self.get_json(&repo.releases_url())?;
            if let Some(release) = releases.into_iter().find(|r| r.prerelease) {
                return Ok(release);
            }
            debug!(
                repo = %repo.repo,
                "No pre-release published, falling back to latest release"
            );
        }

        self.get_json(&repo.latest_release_url())
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> ManagerResult<T> {
        let response = self.client.get(url)?;
        let api_message = serde_json::from_slice::<ApiMessage>(&response.body)
            .ok()
            .map(|m| m.message);

        if let Some(message) = &api_message {
            if message.to_lowercase().contains(RATE_LIMIT_MARKER) {
                return Err(ManagerError::RateLimitExceeded {
                    url: url.to_string(),
                    message: message.clone(),
                });
            }
        }

        if !response.is_success() {
            return Err(ManagerError::ApiError {
                url: url.to_string(),
                status: response.status,
                message: api_message.unwrap_or_else(|| response.text()),
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| ManagerError::DecodeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Pick the first asset whose name starts with `prefix`.
pub fn select_asset<'r>(
    release: &'r RepositoryRelease,
    prefix: &str,
) -> ManagerResult<&'r ReleaseAsset> {
    release
        .assets
        .iter()
        .find(|asset| asset.name.starts_with(prefix))
        .ok_or_else(|| ManagerError::AssetNotFound {
            release: release.tag_name.clone(),
            asset_prefix: prefix.to_string(),
        })
}
