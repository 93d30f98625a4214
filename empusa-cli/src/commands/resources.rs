//! Resources command - list the catalog.

use console::style;
use empusa::resource::{Catalog, ReleaseSource};

use super::common::{build_manager, load_config};
use crate::error::CliError;

/// Run the resources command.
pub fn run() -> Result<(), CliError> {
    let config = load_config();
    let manager = build_manager(&config, false)?;
    let catalog = manager.load_catalog(config.catalog.url.as_deref());

    print_catalog(&catalog);
    Ok(())
}

fn print_catalog(catalog: &Catalog) {
    for category in &catalog.categories {
        println!("{}", style(&category.name).bold());
        for resource in &category.resources {
            let origin = match &resource.stable_release.source {
                ReleaseSource::HostedRepo(repo) => format!("{}/{}", repo.owner, repo.repo),
                ReleaseSource::DirectLink { url, .. } => url.clone(),
            };
            let pre = if resource.pre_release.is_some() {
                " [pre-release available]"
            } else {
                ""
            };
            println!(
                "  {:<16} {}{}",
                resource.name,
                resource.formatted_name(),
                style(pre).dim()
            );
            println!("  {:<16} {}", "", style(origin).dim());
        }
        println!();
    }
    println!("{} resources", catalog.len());
}
