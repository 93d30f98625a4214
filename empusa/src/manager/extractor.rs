//! Zip extraction for downloaded assets.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use super::error::{ManagerError, ManagerResult};
use super::traits::ArchiveExtractor;

/// Extracts zip archives.
///
/// Entries whose names would escape the destination (absolute paths, `..`)
/// are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    /// Create a new zip extractor.
    pub fn new() -> Self {
        Self
    }

    fn open(&self, archive: &Path) -> ManagerResult<ZipArchive<BufReader<File>>> {
        let file = File::open(archive).map_err(|e| ManagerError::read(archive, e))?;
        ZipArchive::new(BufReader::new(file)).map_err(|e| ManagerError::ExtractionFailed {
            path: archive.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
        on_progress: &dyn Fn(f64),
    ) -> ManagerResult<usize> {
        let mut archive = self.open(archive_path)?;
        fs::create_dir_all(dest_dir).map_err(|e| ManagerError::create_dir(dest_dir, e))?;

        let entry_count = archive.len();
        let mut files_extracted = 0usize;

        for index in 0..entry_count {
            let mut entry =
                archive
                    .by_index(index)
                    .map_err(|e| ManagerError::ExtractionFailed {
                        path: archive_path.to_path_buf(),
                        reason: e.to_string(),
                    })?;

            let Some(relative) = entry.enclosed_name() else {
                warn!(entry = %entry.name(), "Skipping archive entry with unsafe path");
                continue;
            };
            let out_path = dest_dir.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path)
                    .map_err(|e| ManagerError::create_dir(&out_path, e))?;
            } else {
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent).map_err(|e| ManagerError::create_dir(parent, e))?;
                }
                let mut out_file =
                    File::create(&out_path).map_err(|e| ManagerError::write(&out_path, e))?;
                io::copy(&mut entry, &mut out_file).map_err(|e| {
                    ManagerError::ExtractionFailed {
                        path: archive_path.to_path_buf(),
                        reason: format!("{}: {}", out_path.display(), e),
                    }
                })?;
                files_extracted += 1;
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                        .map_err(|e| ManagerError::write(&out_path, e))?;
                }
            }

            on_progress((index + 1) as f64 / entry_count as f64);
        }

        if entry_count == 0 {
            on_progress(1.0);
        }

        debug!(
            archive = %archive_path.display(),
            files = files_extracted,
            "Extracted archive"
        );

        Ok(files_extracted)
    }

    fn list_contents(&self, archive_path: &Path) -> ManagerResult<Vec<String>> {
        let archive = self.open(archive_path)?;
        Ok(archive.file_names().map(str::to_string).collect())
    }
}
