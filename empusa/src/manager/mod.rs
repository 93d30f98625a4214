//! Resource acquisition and installation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         ContentManager                           │
//! │  for each resource, strictly in order:                           │
//! │                                                                  │
//! │  ReleaseResolver ──► AssetFetcher ──► ZipExtractor ──► Install   │
//! │  (HostedRepo /       (staging file)   (archives only)  StepExec. │
//! │   DirectLink)                                                    │
//! │        │                  │                 │             │      │
//! │        └──────────────────┴──── Stage ──────┴─────────────┘      │
//! │                               updates                            │
//! │                                  ▼                               │
//! │                         ProgressAggregator ──► ProgressSnapshot  │
//! │                                                                  │
//! │  InstallLog: loaded at batch start, saved once at batch end      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The network is reached only through [`HttpClient`]; [`ReqwestClient`] is
//! the production transport.

mod backup;
mod catalog;
mod config;
mod content;
mod error;
mod extractor;
mod fetcher;
mod http;
mod install_log;
mod installer;
mod progress;
mod release;
mod traits;
mod updates;

#[cfg(test)]
pub(crate) mod testing;

pub use backup::zip_directory;
pub use catalog::{fetch_catalog, load_catalog};
pub use config::ManagerConfig;
pub use content::{BatchHandle, ContentManager, ProcessResult};
pub use error::{ManagerError, ManagerResult};
pub use extractor::ZipExtractor;
pub use fetcher::{AssetFetcher, DownloadedAsset};
pub use http::ReqwestClient;
pub use install_log::{InstallLog, InstalledResource, FILE_NAME as INSTALL_LOG_FILE_NAME};
pub use installer::InstallStepExecutor;
pub use progress::{
    combine, ProgressAggregator, ProgressSnapshot, Stage, StageProgress, RESOURCE_WEIGHT,
};
pub use release::{select_asset, ReleaseAsset, ReleaseResolver, RepositoryRelease, ResolvedRelease};
pub use traits::{ArchiveExtractor, ByteProgress, HttpClient, HttpResponse};
pub use updates::{ResourceStatus, UpdateChecker, UpdateState};
