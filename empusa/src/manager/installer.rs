//! Declarative install steps.
//!
//! Steps place the contents of a downloaded asset onto the volume:
//!
//! | Operation  | Source                    | Target                        |
//! |------------|---------------------------|-------------------------------|
//! | `mergeAll` | whole extracted root      | volume root                   |
//! | `mergeDir` | `<extracted>/<origin>`    | `<volume>/<destination>`      |
//! | `moveFile` | `<extracted>/<origin>`    | `<volume>/<destination>`      |
//!
//! Merges copy, so the same extracted tree can feed several steps. Existing
//! files are always overwritten by the source.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{ManagerError, ManagerResult};
use crate::resource::{validate_relative_path, InstallOperation, InstallStep};

/// Executes install steps against a destination root.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstallStepExecutor;

impl InstallStepExecutor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self
    }

    /// Run `steps` in order, stopping at the first failure.
    ///
    /// Progress across several steps is `(completed + step_fraction) / count`.
    pub fn execute(
        &self,
        steps: &[InstallStep],
        extracted_root: &Path,
        destination_root: &Path,
        on_progress: &dyn Fn(f64),
    ) -> ManagerResult<()> {
        if steps.is_empty() {
            on_progress(1.0);
            return Ok(());
        }

        let count = steps.len() as f64;
        for (index, step) in steps.iter().enumerate() {
            debug!(step = %step, "Executing install step");
            let scaled = |fraction: f64| {
                on_progress((index as f64 + fraction.clamp(0.0, 1.0)) / count);
            };
            self.execute_step(step, extracted_root, destination_root, &scaled)?;
        }

        Ok(())
    }

    fn execute_step(
        &self,
        step: &InstallStep,
        extracted_root: &Path,
        destination_root: &Path,
        on_progress: &dyn Fn(f64),
    ) -> ManagerResult<()> {
        match step.operation {
            InstallOperation::MergeAll => merge(extracted_root, destination_root, on_progress),
            InstallOperation::MergeDir => {
                let origin = step_path(step, step.origin.as_deref(), "origin")?;
                let destination = step_path(step, step.destination.as_deref(), "destination")?;

                let source = extracted_root.join(origin);
                if !source.exists() {
                    return Err(ManagerError::read(
                        source,
                        io::Error::new(io::ErrorKind::NotFound, "merge origin not found in asset"),
                    ));
                }
                merge(&source, &destination_root.join(destination), on_progress)
            }
            InstallOperation::MoveFile => {
                let origin = step_path(step, step.origin.as_deref(), "origin")?;
                let destination = step_path(step, step.destination.as_deref(), "destination")?;
                move_file(extracted_root, origin, destination_root, destination)?;
                on_progress(1.0);
                Ok(())
            }
        }
    }
}

fn step_path<'s>(step: &InstallStep, path: Option<&'s str>, role: &str) -> ManagerResult<&'s str> {
    let path =
        path.ok_or_else(|| ManagerError::InvalidPath(format!("{}: missing {}", step, role)))?;
    validate_relative_path(path).map_err(ManagerError::InvalidPath)?;
    Ok(path)
}

/// Overlay `source` onto `dest`.
///
/// A file source is placed inside `dest` under its own name.
fn merge(source: &Path, dest: &Path, on_progress: &dyn Fn(f64)) -> ManagerResult<()> {
    if source.is_file() {
        let name = source
            .file_name()
            .ok_or_else(|| ManagerError::InvalidPath(source.display().to_string()))?;
        create_dir(dest)?;
        copy_file(source, &dest.join(name))?;
        on_progress(1.0);
        return Ok(());
    }

    let mut entries = Vec::new();
    collect_entries(source, Path::new(""), &mut entries)?;
    create_dir(dest)?;

    let total = entries.len();
    for (index, (relative, is_dir)) in entries.iter().enumerate() {
        let target = dest.join(relative);
        if *is_dir {
            if target.is_file() {
                fs::remove_file(&target).map_err(|e| ManagerError::write(&target, e))?;
            }
            create_dir(&target)?;
        } else {
            copy_file(&source.join(relative), &target)?;
        }
        on_progress((index + 1) as f64 / total as f64);
    }

    if total == 0 {
        on_progress(1.0);
    }

    Ok(())
}

/// Enumerate `root` depth-first, directories before their contents.
fn collect_entries(
    root: &Path,
    relative: &Path,
    entries: &mut Vec<(PathBuf, bool)>,
) -> ManagerResult<()> {
    let dir = root.join(relative);
    let mut children: Vec<_> = fs::read_dir(&dir)
        .map_err(|e| ManagerError::read(&dir, e))?
        .collect::<Result<_, _>>()
        .map_err(|e| ManagerError::read(&dir, e))?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let child_relative = relative.join(child.file_name());
        let is_dir = child
            .file_type()
            .map_err(|e| ManagerError::read(child.path(), e))?
            .is_dir();
        entries.push((child_relative.clone(), is_dir));
        if is_dir {
            collect_entries(root, &child_relative, entries)?;
        }
    }

    Ok(())
}

/// Move a single file (or directory) out of the asset.
///
/// When `extracted_root` is itself a file, `origin` must name it.
fn move_file(
    extracted_root: &Path,
    origin: &str,
    destination_root: &Path,
    destination: &str,
) -> ManagerResult<()> {
    let source = if extracted_root.is_file() {
        let own_name = extracted_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let origin = origin.trim_end_matches('/');
        if !(origin.is_empty() || origin == "." || origin == own_name) {
            return Err(ManagerError::InvalidPath(format!(
                "origin '{}' does not match asset '{}'",
                origin, own_name
            )));
        }
        extracted_root.to_path_buf()
    } else {
        extracted_root.join(origin)
    };

    if !source.exists() {
        return Err(ManagerError::read(
            source,
            io::Error::new(io::ErrorKind::NotFound, "move origin not found in asset"),
        ));
    }

    let mut target = destination_root.join(destination);
    if destination.ends_with('/') || destination.is_empty() || target.is_dir() {
        let name = source
            .file_name()
            .ok_or_else(|| ManagerError::InvalidPath(source.display().to_string()))?;
        target = target.join(name);
    }

    if let Some(parent) = target.parent() {
        create_dir(parent)?;
    }
    if target.is_file() {
        fs::remove_file(&target).map_err(|e| ManagerError::write(&target, e))?;
    }

    debug!(from = %source.display(), to = %target.display(), "Moving file");
    move_path(&source, &target)
}

/// Rename, falling back to copy + remove across filesystems.
fn move_path(source: &Path, target: &Path) -> ManagerResult<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    if source.is_dir() {
        copy_dir_recursive(source, target).and_then(|()| {
            fs::remove_dir_all(source).map_err(|e| ManagerError::MoveFailed {
                from: source.to_path_buf(),
                to: target.to_path_buf(),
                source: e,
            })
        })
    } else {
        fs::copy(source, target)
            .and_then(|_| fs::remove_file(source))
            .map_err(|e| ManagerError::MoveFailed {
                from: source.to_path_buf(),
                to: target.to_path_buf(),
                source: e,
            })
    }
}

fn copy_file(source: &Path, target: &Path) -> ManagerResult<()> {
    if let Some(parent) = target.parent() {
        create_dir(parent)?;
    }
    debug!(from = %source.display(), to = %target.display(), "Merging file");
    fs::copy(source, target).map_err(|e| ManagerError::write(target, e))?;
    Ok(())
}

fn create_dir(path: &Path) -> ManagerResult<()> {
    fs::create_dir_all(path).map_err(|e| ManagerError::create_dir(path, e))
}

/// Recursively copy a directory.
fn copy_dir_recursive(source: &Path, dest: &Path) -> ManagerResult<()> {
    create_dir(dest)?;

    for entry in fs::read_dir(source).map_err(|e| ManagerError::read(source, e))? {
        let entry = entry.map_err(|e| ManagerError::read(source, e))?;
        let source_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if source_path.is_dir() {
            copy_dir_recursive(&source_path, &dest_path)?;
        } else {
            fs::copy(&source_path, &dest_path).map_err(|e| ManagerError::write(&dest_path, e))?;
        }
    }

    Ok(())
}
