//! Common helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use empusa::config::ConfigFile;
use empusa::manager::{ContentManager, ReqwestClient};
use empusa::resource::{Catalog, ResourceDefinition};
use empusa::volume::Volume;
use tracing::warn;

use crate::error::CliError;

/// Load config or fall back to defaults.
pub fn load_config() -> ConfigFile {
    ConfigFile::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ConfigFile::default()
    })
}

/// Build a content manager from the config file.
///
/// `prerelease` forces pre-release preference on top of the config value.
pub fn build_manager(
    config: &ConfigFile,
    prerelease: bool,
) -> Result<ContentManager<ReqwestClient>, CliError> {
    let mut manager_config = config.to_manager_config();
    if prerelease {
        manager_config = manager_config.with_prefer_prerelease(true);
    }
    let client = ReqwestClient::from_config(&manager_config)?;
    Ok(ContentManager::new(client, manager_config))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// Open the volume mounted at `path`.
pub fn open_volume(path: &Path) -> Result<Volume, CliError> {
    Ok(Volume::from_path(expand_home(path))?)
}

/// Pick resources by name, in the order requested.
///
/// An empty selection means every resource in catalog order.
pub fn select_resources(
    catalog: &Catalog,
    names: &[String],
) -> Result<Vec<ResourceDefinition>, CliError> {
    if names.is_empty() {
        return Ok(catalog.resources().cloned().collect());
    }

    let mut selected: Vec<ResourceDefinition> = Vec::with_capacity(names.len());
    for name in names {
        let resource = catalog
            .find(name)
            .ok_or_else(|| CliError::UnknownResource(name.clone()))?;
        if !selected.iter().any(|r| r.name == resource.name) {
            selected.push(resource.clone());
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use empusa::resource::builtin_catalog;

    #[test]
    fn test_select_all_by_default() {
        let catalog = builtin_catalog();
        let selected = select_resources(&catalog, &[]).unwrap();
        assert_eq!(selected.len(), catalog.len());
    }

    #[test]
    fn test_select_keeps_requested_order_without_duplicates() {
        let catalog = builtin_catalog();
        let names: Vec<String> = catalog.resources().map(|r| r.name.clone()).collect();
        let request = vec![names[1].clone(), names[0].clone(), names[1].clone()];

        let selected = select_resources(&catalog, &request).unwrap();

        let picked: Vec<&str> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(picked, vec![names[1].as_str(), names[0].as_str()]);
    }

    #[test]
    fn test_select_unknown_resource() {
        let result = select_resources(&builtin_catalog(), &["nope".to_string()]);
        assert!(matches!(result, Err(CliError::UnknownResource(name)) if name == "nope"));
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home(Path::new("/mnt/sd")), PathBuf::from("/mnt/sd"));
    }

    #[test]
    fn test_open_volume() {
        let temp = tempfile::TempDir::new().unwrap();
        let volume = open_volume(temp.path()).unwrap();
        assert!(!volume.is_none());
        assert!(open_volume(&temp.path().join("missing")).is_err());
    }
}
