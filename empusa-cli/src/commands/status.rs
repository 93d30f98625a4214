//! Status command - installed and available versions on a volume.

use std::path::Path;

use console::style;
use empusa::manager::{ResourceStatus, UpdateState};

use super::common::{build_manager, load_config, open_volume};
use crate::error::CliError;

/// Run the status command.
pub fn run(volume: &Path, prerelease: bool) -> Result<(), CliError> {
    let config = load_config();
    let manager = build_manager(&config, prerelease)?;
    let volume = open_volume(volume)?;
    let catalog = manager.load_catalog(config.catalog.url.as_deref());
    let resources: Vec<_> = catalog.resources().cloned().collect();

    println!("Checking {} resources on {}...", resources.len(), volume.name);
    println!();

    let statuses = manager.check_updates(&resources, &volume)?;
    print_table(&statuses);

    let updates = statuses
        .iter()
        .filter(|s| s.state == UpdateState::UpdateAvailable)
        .count();
    println!();
    if updates > 0 {
        println!(
            "{} update(s) available. Run 'empusa install --volume {}' to update.",
            updates,
            volume.path.display()
        );
    }

    Ok(())
}

fn print_table(statuses: &[ResourceStatus]) {
    let name_width = statuses
        .iter()
        .map(|s| s.formatted_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Resource".len());

    println!(
        "{:<name_width$}  {:<14}  {:<14}  Status",
        "Resource", "Installed", "Available"
    );
    println!("{}", "-".repeat(name_width + 50));

    for status in statuses {
        println!(
            "{:<name_width$}  {:<14}  {:<14}  {}",
            status.formatted_name,
            status.installed_version.as_deref().unwrap_or("-"),
            status.available_version.as_deref().unwrap_or("?"),
            styled_state(status.state)
        );
    }
}

fn styled_state(state: UpdateState) -> String {
    match state {
        UpdateState::UpToDate => style(state.label()).green().to_string(),
        UpdateState::UpdateAvailable => style(state.label()).yellow().bold().to_string(),
        UpdateState::NotInstalled => style(state.label()).dim().to_string(),
        UpdateState::Unknown => style(state.label()).red().to_string(),
    }
}
