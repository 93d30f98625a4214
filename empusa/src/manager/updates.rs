//! Installed versus available versions.

use std::fmt;

use tracing::debug;

use super::install_log::InstallLog;
use super::release::ReleaseResolver;
use super::traits::HttpClient;
use crate::resource::ResourceDefinition;
use crate::version::is_higher_than;

/// Update state of a resource on a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateState {
    /// Not present in the install log.
    NotInstalled,
    /// The installed version is the newest available.
    UpToDate,
    /// A newer version is available.
    UpdateAvailable,
    /// One of the versions is not known.
    Unknown,
}

impl UpdateState {
    /// Compute the state from installed and available versions.
    pub fn from_versions(installed: Option<&str>, available: Option<&str>) -> Self {
        match (installed, available) {
            (Some(installed), Some(available)) => {
                if is_higher_than(available, installed) {
                    Self::UpdateAvailable
                } else {
                    Self::UpToDate
                }
            }
            _ => Self::Unknown,
        }
    }

    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotInstalled => "not installed",
            Self::UpToDate => "up to date",
            Self::UpdateAvailable => "update available",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Versions of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus {
    pub name: String,
    pub formatted_name: String,
    pub installed_version: Option<String>,
    pub available_version: Option<String>,
    pub state: UpdateState,
}

/// Compares an install log against the current releases.
pub struct UpdateChecker<'a, C: HttpClient + ?Sized> {
    resolver: ReleaseResolver<'a, C>,
    prefer_prerelease: bool,
}

impl<'a, C: HttpClient + ?Sized> UpdateChecker<'a, C> {
    pub fn new(client: &'a C, prefer_prerelease: bool) -> Self {
        Self {
            resolver: ReleaseResolver::new(client, prefer_prerelease),
            prefer_prerelease,
        }
    }

    /// Status of every resource, in input order.
    ///
    /// Resolution failures leave the available version unknown.
    pub fn check(&self, resources: &[ResourceDefinition], log: &InstallLog) -> Vec<ResourceStatus> {
        resources
            .iter()
            .map(|resource| self.check_one(resource, log))
            .collect()
    }

    fn check_one(&self, resource: &ResourceDefinition, log: &InstallLog) -> ResourceStatus {
        let descriptor = resource.release(self.prefer_prerelease);
        let available_version = match self.resolver.resolve(descriptor) {
            Ok(resolved) => resolved.version,
            Err(e) => {
                debug!(resource = %resource.name, error = %e, "Could not resolve available version");
                None
            }
        };

        let installed = log.entry(&resource.name);
        let installed_version = installed.and_then(|e| e.version.clone());
        let state = match installed {
            None => UpdateState::NotInstalled,
            Some(_) => UpdateState::from_versions(
                installed_version.as_deref(),
                available_version.as_deref(),
            ),
        };

        ResourceStatus {
            name: resource.name.clone(),
            formatted_name: resource.formatted_name(),
            installed_version,
            available_version,
            state,
        }
    }
}
