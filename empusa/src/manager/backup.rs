//! Zip backups of a whole volume.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::{ManagerError, ManagerResult};

/// Entries of this size and above need zip64 headers.
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Zip everything under `root` into `archive`, skipping hidden entries.
///
/// Returns the number of files written.
pub fn zip_directory(root: &Path, archive: &Path, on_progress: &dyn Fn(f64)) -> ManagerResult<usize> {
    if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ManagerError::create_dir(parent, e))?;
    }
    let archive = resolve_archive_path(archive)?;
    let root = root.canonicalize().map_err(|e| ManagerError::read(root, e))?;

    let mut entries = Vec::new();
    collect_visible(&root, Path::new(""), &archive, &mut entries)?;

    let file = File::create(&archive).map_err(|e| ManagerError::write(&archive, e))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let zip_error = |e: zip::result::ZipError| ManagerError::ArchiveFailed {
        path: archive.clone(),
        reason: e.to_string(),
    };

    let total = entries.len();
    let mut files = 0usize;
    for (index, (relative, is_dir)) in entries.iter().enumerate() {
        let name = entry_name(relative);
        if *is_dir {
            writer.add_directory(name, options).map_err(zip_error)?;
        } else {
            let source = root.join(relative);
            let mut input = File::open(&source).map_err(|e| ManagerError::read(&source, e))?;
            let len = input
                .metadata()
                .map_err(|e| ManagerError::read(&source, e))?
                .len();
            writer
                .start_file(name, options.large_file(needs_large_file(len)))
                .map_err(zip_error)?;
            io::copy(&mut input, &mut writer).map_err(|e| ManagerError::write(&archive, e))?;
            files += 1;
        }
        on_progress((index + 1) as f64 / total as f64);
    }

    writer.finish().map_err(zip_error)?;
    if total == 0 {
        on_progress(1.0);
    }

    info!(root = %root.display(), archive = %archive.display(), files, "Created backup");
    Ok(files)
}

fn needs_large_file(len: u64) -> bool {
    len >= LARGE_FILE_THRESHOLD
}

/// Absolute, symlink-free location of `archive`, which need not exist yet.
fn resolve_archive_path(archive: &Path) -> ManagerResult<PathBuf> {
    let name = archive
        .file_name()
        .ok_or_else(|| ManagerError::InvalidPath(format!("{} names no file", archive.display())))?;
    let parent = match archive.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = parent
        .canonicalize()
        .map_err(|e| ManagerError::read(parent, e))?;
    Ok(parent.join(name))
}

/// Zip entry name with `/` separators.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn collect_visible(
    root: &Path,
    relative: &Path,
    exclude: &Path,
    entries: &mut Vec<(PathBuf, bool)>,
) -> ManagerResult<()> {
    let dir = root.join(relative);
    let mut children: Vec<_> = fs::read_dir(&dir)
        .map_err(|e| ManagerError::read(&dir, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| ManagerError::read(&dir, e))?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        if is_hidden(&child.file_name()) || child.path() == exclude {
            continue;
        }
        let child_relative = relative.join(child.file_name());
        let is_dir = child
            .file_type()
            .map_err(|e| ManagerError::read(child.path(), e))?
            .is_dir();
        entries.push((child_relative.clone(), is_dir));
        if is_dir {
            collect_visible(root, &child_relative, exclude, entries)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::extractor::ZipExtractor;
    use crate::manager::traits::ArchiveExtractor;
    use tempfile::TempDir;

    #[test]
    fn test_zip_directory_skips_hidden_entries() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("volume");
        fs::create_dir_all(root.join("atmosphere/contents")).unwrap();
        fs::create_dir_all(root.join(".Spotlight-V100")).unwrap();
        fs::write(root.join("atmosphere/contents/title.txt"), "t").unwrap();
        fs::write(root.join("hbmenu.nro"), "menu").unwrap();
        fs::write(root.join(".DS_Store"), "junk").unwrap();
        fs::write(root.join(".Spotlight-V100/store.db"), "db").unwrap();

        let archive = temp.path().join("backup.zip");
        let files = zip_directory(&root, &archive, &|_| {}).unwrap();
        assert_eq!(files, 2);

        let mut names = ZipExtractor::new().list_contents(&archive).unwrap();
        names.sort();
        assert_eq!(
            names,
            vec![
                "atmosphere/",
                "atmosphere/contents/",
                "atmosphere/contents/title.txt",
                "hbmenu.nro",
            ]
        );
    }

    #[test]
    fn test_archive_inside_root_is_not_included() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        let archive = temp.path().join("backup.zip");
        fs::write(&archive, "stale").unwrap();

        zip_directory(temp.path(), &archive, &|_| {}).unwrap();

        let names = ZipExtractor::new().list_contents(&archive).unwrap();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[test]
    fn test_archive_reached_through_other_path_is_not_included() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("volume");
        fs::create_dir_all(root.join("backups")).unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        let archive = root.join("backups/../backup.zip");
        fs::write(root.join("backup.zip"), "stale").unwrap();

        zip_directory(&root, &archive, &|_| {}).unwrap();

        let mut names = ZipExtractor::new().list_contents(&root.join("backup.zip")).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt", "backups/"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_archive_through_symlinked_root_is_not_included() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("volume");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        let link = temp.path().join("sd");
        std::os::unix::fs::symlink(&root, &link).unwrap();
        fs::write(root.join("backup.zip"), "stale").unwrap();

        zip_directory(&link, &root.join("backup.zip"), &|_| {}).unwrap();

        let names = ZipExtractor::new().list_contents(&root.join("backup.zip")).unwrap();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[test]
    fn test_large_files_use_zip64() {
        assert!(!needs_large_file(0));
        assert!(!needs_large_file(LARGE_FILE_THRESHOLD - 1));
        assert!(needs_large_file(LARGE_FILE_THRESHOLD));
        assert!(needs_large_file(5 * 1024 * 1024 * 1024));
    }

    #[test]
    fn test_missing_root_is_read_error() {
        let temp = TempDir::new().unwrap();
        let err = zip_directory(&temp.path().join("gone"), &temp.path().join("b.zip"), &|_| {})
            .unwrap_err();
        assert!(matches!(err, ManagerError::ReadFailed { .. }));
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let relative: PathBuf = ["bootloader", "payloads", "x.bin"].iter().collect();
        assert_eq!(entry_name(&relative), "bootloader/payloads/x.bin");
    }
}
