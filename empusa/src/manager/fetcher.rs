//! Asset downloads into the staging directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::error::ManagerResult;
use super::traits::HttpClient;

/// Downloads release assets, reporting progress as a fraction.
pub struct AssetFetcher<'a, C: HttpClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: HttpClient + ?Sized> AssetFetcher<'a, C> {
    /// Create a fetcher using the given transport.
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Download `url` to `dest`.
    ///
    /// Fractions are `received / content_length` clamped to `[0, 1]`; without
    /// a content length only the final `1.0` is reported. On failure the
    /// partial file is removed and nothing more is reported.
    pub fn fetch(&self, url: &str, dest: &Path, on_progress: &dyn Fn(f64)) -> ManagerResult<u64> {
        let result = self.client.download(url, dest, &|received, total| {
            if let Some(total) = total.filter(|t| *t > 0) {
                on_progress((received as f64 / total as f64).clamp(0.0, 1.0));
            }
        });

        match result {
            Ok(bytes) => {
                on_progress(1.0);
                info!(url = %url, bytes, "Downloaded asset");
                Ok(bytes)
            }
            Err(e) => {
                remove_file_logged(dest);
                Err(e)
            }
        }
    }
}

/// A downloaded asset awaiting installation.
///
/// Dropping it removes the asset file and the extraction directory, if any.
/// Removal is best-effort; failures are logged.
#[derive(Debug)]
pub struct DownloadedAsset {
    /// Resolved version, recorded in the install log on success.
    pub version: Option<String>,

    /// Staging file holding the asset.
    pub path: PathBuf,

    extracted_dir: Option<PathBuf>,
}

impl DownloadedAsset {
    /// Track a staging file.
    pub fn new(version: Option<String>, path: PathBuf) -> Self {
        Self {
            version,
            path,
            extracted_dir: None,
        }
    }

    /// Record the directory the asset was extracted into.
    pub fn set_extracted_dir(&mut self, dir: PathBuf) {
        self.extracted_dir = Some(dir);
    }

    /// Root the install steps operate on: the extraction directory for
    /// archives, the asset file itself otherwise.
    pub fn content_root(&self) -> &Path {
        self.extracted_dir.as_deref().unwrap_or(&self.path)
    }
}

impl Drop for DownloadedAsset {
    fn drop(&mut self) {
        remove_file_logged(&self.path);
        if let Some(dir) = &self.extracted_dir {
            if let Err(e) = fs::remove_dir_all(dir) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %dir.display(), error = %e, "Failed to remove extraction directory");
                }
            }
        }
    }
}

fn remove_file_logged(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove staging file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::testing::FakeHttpClient;
    use crate::manager::ManagerError;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const URL: &str = "https://example.com/hekate.zip";

    #[test]
    fn test_fetch_reports_fractions() {
        let temp = TempDir::new().unwrap();
        let client = FakeHttpClient::new().with_asset(URL, vec![7u8; 100]);
        let dest = temp.path().join("download");

        let fractions = Mutex::new(Vec::new());
        let bytes = AssetFetcher::new(&client)
            .fetch(URL, &dest, &|f| fractions.lock().unwrap().push(f))
            .unwrap();

        assert_eq!(bytes, 100);
        assert_eq!(fs::read(&dest).unwrap().len(), 100);
        assert_eq!(fractions.into_inner().unwrap(), vec![0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_unknown_length_reports_only_completion() {
        let temp = TempDir::new().unwrap();
        let client = FakeHttpClient::new()
            .with_asset(URL, vec![1u8; 10])
            .without_content_length();

        let fractions = Mutex::new(Vec::new());
        AssetFetcher::new(&client)
            .fetch(URL, &temp.path().join("download"), &|f| {
                fractions.lock().unwrap().push(f)
            })
            .unwrap();

        assert_eq!(fractions.into_inner().unwrap(), vec![1.0]);
    }

    #[test]
    fn test_failed_fetch_reports_nothing_and_removes_partial() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("download");
        fs::write(&dest, "partial").unwrap();
        let client = FakeHttpClient::new();

        let fractions = Mutex::new(Vec::new());
        let err = AssetFetcher::new(&client)
            .fetch(URL, &dest, &|f| fractions.lock().unwrap().push(f))
            .unwrap_err();

        assert!(matches!(err, ManagerError::DownloadFailed { .. }));
        assert!(fractions.into_inner().unwrap().is_empty());
        assert!(!dest.exists());
    }

    #[test]
    fn test_downloaded_asset_cleans_up_on_drop() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("hekate.zip");
        let dir = temp.path().join("hekate");
        fs::write(&file, "zip").unwrap();
        fs::create_dir_all(dir.join("bootloader")).unwrap();
        fs::write(dir.join("bootloader/hekate_ipl.ini"), "ini").unwrap();

        {
            let mut asset = DownloadedAsset::new(Some("v6.2.0".to_string()), file.clone());
            assert_eq!(asset.content_root(), file.as_path());
            asset.set_extracted_dir(dir.clone());
            assert_eq!(asset.content_root(), dir.as_path());
        }

        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_drop_tolerates_already_moved_file() {
        let temp = TempDir::new().unwrap();
        let asset = DownloadedAsset::new(None, temp.path().join("moved.bin"));
        drop(asset);
    }
}
