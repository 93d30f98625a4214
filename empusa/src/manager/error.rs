//! Error types for the content manager.

use std::io;
use std::path::PathBuf;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors that can occur while acquiring and installing resources.
#[derive(Debug)]
pub enum ManagerError {
    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file or directory.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to move a file or directory into place.
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Transport-level failure (DNS, connection reset, TLS).
    Network { url: String, reason: String },

    /// Network timeout.
    Timeout { url: String, timeout_secs: u64 },

    /// The release API refused the request because of rate limiting.
    RateLimitExceeded { url: String, message: String },

    /// The release API answered with a non-success status.
    ApiError {
        url: String,
        status: u16,
        message: String,
    },

    /// A metadata payload could not be decoded.
    DecodeFailed { url: String, reason: String },

    /// No asset in the resolved release matched the expected prefix.
    AssetNotFound {
        release: String,
        asset_prefix: String,
    },

    /// Failed to download an asset.
    DownloadFailed { url: String, reason: String },

    /// Archive extraction failed.
    ExtractionFailed { path: PathBuf, reason: String },

    /// Writing a backup archive failed.
    ArchiveFailed { path: PathBuf, reason: String },

    /// Invalid path provided by a catalog or caller.
    InvalidPath(String),

    /// The batch was started without a destination volume.
    NoVolumeSelected,

    /// Erasing or formatting the destination volume failed.
    ///
    /// Produced by external formatter integrations, never by the pipeline
    /// itself.
    FormatFailed { volume: String, reason: String },

    /// The background worker running a batch panicked or was aborted.
    TaskFailed(String),
}

impl ManagerError {
    /// Whether the error was caused by upstream API rate limiting.
    ///
    /// Callers use this to suggest retrying later or from another network.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }

    /// Whether the error originated on the network rather than on disk.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::RateLimitExceeded { .. }
                | Self::ApiError { .. }
                | Self::DownloadFailed { .. }
        )
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn create_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::CreateDirFailed {
            path: path.into(),
            source,
        }
    }
}

impl std::fmt::Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::MoveFailed { from, to, source } => {
                write!(
                    f,
                    "failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::Network { url, reason } => {
                write!(f, "network error while requesting {}: {}", url, reason)
            }
            Self::Timeout { url, timeout_secs } => {
                write!(f, "request to {} timed out after {}s", url, timeout_secs)
            }
            Self::RateLimitExceeded { url, message } => {
                write!(f, "rate limit exceeded for {}: {}", url, message)
            }
            Self::ApiError {
                url,
                status,
                message,
            } => {
                write!(f, "{} returned status {}: {}", url, status, message)
            }
            Self::DecodeFailed { url, reason } => {
                write!(f, "failed to decode response from {}: {}", url, reason)
            }
            Self::AssetNotFound {
                release,
                asset_prefix,
            } => {
                write!(
                    f,
                    "no asset starting with '{}' in release {}",
                    asset_prefix, release
                )
            }
            Self::DownloadFailed { url, reason } => {
                write!(f, "failed to download {}: {}", url, reason)
            }
            Self::ExtractionFailed { path, reason } => {
                write!(f, "failed to extract {}: {}", path.display(), reason)
            }
            Self::ArchiveFailed { path, reason } => {
                write!(f, "failed to create archive {}: {}", path.display(), reason)
            }
            Self::InvalidPath(msg) => write!(f, "invalid path: {}", msg),
            Self::NoVolumeSelected => write!(f, "no destination volume selected"),
            Self::FormatFailed { volume, reason } => {
                write!(f, "failed to format volume {}: {}", volume, reason)
            }
            Self::TaskFailed(msg) => write!(f, "background task failed: {}", msg),
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            Self::MoveFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
