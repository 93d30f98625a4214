//! Empusa: download and install versioned homebrew resources onto a
//! removable volume, and keep track of what is installed.
//!
//! # Modules
//!
//! - [`resource`]: resource definitions, release descriptors, catalogs
//! - [`manager`]: release resolution, downloads, install steps, batches
//! - [`version`]: dotted version comparison
//! - [`volume`]: destination volumes
//! - [`config`]: `~/.empusa/config.ini`
//! - [`logging`]: file logging setup
//!
//! # Example
//!
//! ```no_run
//! use empusa::config::ConfigFile;
//! use empusa::manager::{ContentManager, ReqwestClient};
//! use empusa::volume::Volume;
//!
//! let config = ConfigFile::load()?.to_manager_config();
//! let client = ReqwestClient::from_config(&config)?;
//! let manager = ContentManager::new(client, config);
//!
//! let catalog = manager.load_catalog(None);
//! let resources: Vec<_> = catalog.resources().cloned().collect();
//! let volume = Volume::from_path("/Volumes/SWITCH SD")?;
//!
//! let result = manager.download(&resources, &volume, |snapshot| {
//!     println!("{} {:.0}%", snapshot.title, snapshot.fraction() * 100.0);
//! });
//! println!("installed: {:?}", result.succeeded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod logging;
pub mod manager;
pub mod resource;
pub mod version;
pub mod volume;
