//! Backup and restore commands.

use std::path::Path;

use empusa::manager::ProgressSnapshot;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::common::{build_manager, expand_home, load_config, open_volume};
use crate::error::CliError;

/// Zip the contents of a volume.
pub fn run_backup(volume: &Path, output: &Path) -> Result<(), CliError> {
    let config = load_config();
    let manager = build_manager(&config, false)?;
    let volume = open_volume(volume)?;
    let output = expand_home(output);

    println!("Backing up {} to {}", volume.name, output.display());
    let bar = fraction_bar();
    let files = manager.backup_volume(volume.root(), &output, &|s| update(&bar, &s))?;
    bar.finish_and_clear();

    info!(archive = %output.display(), files, "Backup written");
    println!("Archived {} files", files);
    Ok(())
}

/// Extract a backup over a volume.
pub fn run_restore(archive: &Path, volume: &Path) -> Result<(), CliError> {
    let config = load_config();
    let manager = build_manager(&config, false)?;
    let volume = open_volume(volume)?;
    let archive = expand_home(archive);

    println!("Restoring {} onto {}", archive.display(), volume.name);
    let bar = fraction_bar();
    let files = manager.restore_backup(&archive, volume.root(), &|s| update(&bar, &s))?;
    bar.finish_and_clear();

    println!("Restored {} files", files);
    Ok(())
}

fn fraction_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    if let Ok(template) = ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {msg}") {
        bar.set_style(template.progress_chars("=> "));
    }
    bar
}

fn update(bar: &ProgressBar, snapshot: &ProgressSnapshot) {
    bar.set_position((snapshot.fraction() * 100.0).round() as u64);
    bar.set_message(snapshot.title.clone());
}
