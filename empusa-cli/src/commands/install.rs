//! Install command - download resources onto a volume.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use empusa::manager::{ContentManager, ProcessResult, ProgressSnapshot, ReqwestClient};
use empusa::resource::ResourceDefinition;
use empusa::volume::Volume;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::common::{build_manager, load_config, open_volume, select_resources};
use crate::error::CliError;

/// Progress units per unit of batch work.
const BAR_SCALE: f64 = 100.0;

/// Arguments for the install command.
pub struct InstallArgs {
    pub volume: PathBuf,
    pub resources: Vec<String>,
    pub prerelease: bool,
}

/// Run the install command.
pub fn run(args: InstallArgs) -> Result<(), CliError> {
    let config = load_config();
    let manager = build_manager(&config, args.prerelease)?;
    let catalog = manager.load_catalog(config.catalog.url.as_deref());
    let resources = select_resources(&catalog, &args.resources)?;
    let volume = open_volume(&args.volume)?;
    let total = resources.len();

    println!(
        "Installing {} resource(s) onto {} ({})",
        total,
        style(&volume.name).bold(),
        volume.formatted_capacity()
    );
    if manager.config().prefer_prerelease {
        println!("Pre-release versions preferred");
    }
    println!();

    info!(volume = %volume.path.display(), resources = total, "Install requested");

    // The blocking HTTP client owns its own runtime and must not be dropped
    // inside an async context, so the batch runs on a blocking worker.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    let result = runtime.block_on(run_batch(Arc::new(manager), resources, volume))?;

    print_result(&result);

    if let Some(e) = result.log_error {
        return Err(e.into());
    }
    if !result.failed.is_empty() {
        return Err(CliError::BatchFailed {
            failed: result.failed.len(),
            total,
        });
    }
    Ok(())
}

async fn run_batch(
    manager: Arc<ContentManager<ReqwestClient>>,
    resources: Vec<ResourceDefinition>,
    volume: Volume,
) -> Result<ProcessResult, CliError> {
    let bar = progress_bar();
    let mut handle = manager.spawn_download(resources, volume);

    while let Some(snapshot) = handle.next_progress().await {
        update_bar(&bar, &snapshot);
    }
    bar.finish_and_clear();

    Ok(handle.wait().await?)
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let template = ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {msg}");
    if let Ok(template) = template {
        bar.set_style(template.progress_chars("=> "));
    }
    bar
}

fn update_bar(bar: &ProgressBar, snapshot: &ProgressSnapshot) {
    bar.set_length((snapshot.total * BAR_SCALE).round() as u64);
    bar.set_position((snapshot.progress * BAR_SCALE).round() as u64);
    bar.set_message(snapshot.title.clone());
}

fn print_result(result: &ProcessResult) {
    for name in &result.succeeded {
        println!("  {} {}", style("✓").green(), name);
    }
    for (name, error) in &result.failed {
        println!("  {} {}: {}", style("✗").red(), name, error);
    }
    println!();

    if result.rate_limited() {
        println!(
            "{}",
            style("The release API rate limit was reached.").yellow()
        );
        println!("Wait up to an hour before retrying, or retry from another network.");
        println!("Resources that succeeded do not need to be installed again.");
        println!();
    }

    if result.is_success() {
        println!("All resources installed.");
    }
}
