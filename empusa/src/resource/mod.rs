//! Resource definitions and catalog parsing.
//!
//! A *resource* is an installable package (a bootloader, a custom firmware, a
//! homebrew app) described entirely by data:
//!
//! ```text
//! Category
//! └── ResourceDefinition
//!     ├── name / display_name
//!     ├── stable_release: ReleaseDescriptor
//!     └── pre_release:    Option<ReleaseDescriptor>
//!                         ├── source: ReleaseSource (HostedRepo | DirectLink)
//!                         ├── asset_filename
//!                         └── install_steps: [InstallStep]
//! ```
//!
//! Definitions are never created at runtime; they come from a remote catalog
//! document or from the catalog built into the binary.

mod catalog;
mod definition;
mod source;
mod step;

pub use catalog::{builtin_catalog, parse_catalog, Catalog, Category};
pub use definition::{ReleaseDescriptor, ResourceDefinition};
pub use source::{HostedRepo, ReleaseSource, DEFAULT_API_BASE};
pub use step::{InstallOperation, InstallStep};

use std::path::{Component, Path};

/// Reject paths that are absolute or climb out of their root.
pub(crate) fn validate_relative_path(path: &str) -> Result<(), String> {
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("'{}' must not contain '..'", path));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("'{}' must be relative", path));
            }
        }
    }
    Ok(())
}
