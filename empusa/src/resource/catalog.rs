//! Resource catalog documents.
//!
//! A catalog is a JSON array of categories, each listing resource
//! definitions. The same format is used for remotely hosted catalogs and for
//! the catalog compiled into the binary.

use serde::{Deserialize, Serialize};

use super::definition::ResourceDefinition;

const BUILTIN_CATALOG: &str = include_str!("../../resources/catalog.json");

/// A named group of resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub resources: Vec<ResourceDefinition>,
}

/// All categories of a catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    /// Create a catalog from categories.
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Iterate over every resource in category order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.categories
            .iter()
            .flat_map(|category| category.resources.iter())
    }

    /// Find a resource by name.
    pub fn find(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources().find(|resource| resource.name == name)
    }

    /// Number of resources across all categories.
    pub fn len(&self) -> usize {
        self.categories
            .iter()
            .map(|category| category.resources.len())
            .sum()
    }

    /// Whether the catalog has no resources.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a catalog document.
pub fn parse_catalog(json: &str) -> Result<Catalog, serde_json::Error> {
    let categories: Vec<Category> = serde_json::from_str(json)?;
    Ok(Catalog::new(categories))
}

/// The catalog shipped with the binary.
pub fn builtin_catalog() -> Catalog {
    parse_catalog(BUILTIN_CATALOG).expect("built-in catalog must be valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{InstallOperation, ReleaseSource};

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = builtin_catalog();
        assert!(!catalog.is_empty());

        for name in [
            "hekate",
            "atmosphere",
            "sigpatches",
            "tinfoil",
            "bootLogos",
            "lockpickRCM",
        ] {
            assert!(catalog.find(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_builtin_lockpick_is_not_archived() {
        let catalog = builtin_catalog();
        let lockpick = catalog.find("lockpickRCM").unwrap();
        let release = lockpick.release(false);

        assert!(!release.is_archive());
        assert_eq!(release.install_steps.len(), 1);
        assert_eq!(
            release.install_steps[0].operation,
            InstallOperation::MoveFile
        );
    }

    #[test]
    fn test_builtin_sigpatches_has_static_version() {
        let catalog = builtin_catalog();
        let sigpatches = catalog.find("sigpatches").unwrap();
        assert!(matches!(
            sigpatches.stable_release.source,
            ReleaseSource::DirectLink { .. }
        ));
    }

    #[test]
    fn test_parse_catalog() {
        let json = r#"[
            {
                "name": "Bootloaders",
                "resources": [
                    {
                        "name": "hekate",
                        "display_name": "Hekate",
                        "stable_release": {
                            "repository": {"owner": "CTCaer", "repo": "hekate", "asset_prefix": "hekate_ctcaer_"},
                            "asset_filename": "hekate.zip",
                            "install_steps": [{"operation": "mergeDir", "origin": "bootloader", "destination": "bootloader"}]
                        }
                    }
                ]
            },
            {
                "name": "Patches",
                "resources": [
                    {
                        "name": "sigpatches",
                        "display_name": "Sigpatches",
                        "additional_description": "(for Atmosphère)",
                        "stable_release": {
                            "version": "16.1.0",
                            "asset_url": "https://example.com/sigpatches.zip",
                            "asset_filename": "sigpatches.zip",
                            "install_steps": [{"operation": "mergeAll"}]
                        }
                    }
                ]
            }
        ]"#;

        let catalog = parse_catalog(json).unwrap();
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.len(), 2);

        let names: Vec<_> = catalog.resources().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["hekate", "sigpatches"]);
        assert_eq!(
            catalog.find("sigpatches").unwrap().formatted_name(),
            "Sigpatches (for Atmosphère)"
        );
        assert!(catalog.find("tinfoil").is_none());
    }

    #[test]
    fn test_parse_catalog_rejects_invalid_step() {
        let json = r#"[{"name": "x", "resources": [{
            "name": "bad", "display_name": "Bad",
            "stable_release": {
                "asset_url": "https://example.com/a.zip",
                "asset_filename": "a.zip",
                "install_steps": [{"operation": "moveFile"}]
            }
        }]}]"#;
        assert!(parse_catalog(json).is_err());
    }
}
