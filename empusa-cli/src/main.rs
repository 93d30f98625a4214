//! Empusa CLI - provision removable volumes with homebrew resources.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use empusa::config::ConfigFile;
use empusa::logging::init_logging;
use tracing::{error, info};

use commands::config::ConfigCommands;
use commands::install::InstallArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "empusa", version, about = "Download and install homebrew resources onto a removable volume")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download and install resources onto a volume
    Install {
        /// Mount point of the destination volume
        #[arg(long)]
        volume: PathBuf,

        /// Resource to install (repeatable; default: every catalog resource)
        #[arg(short, long = "resource", value_name = "NAME")]
        resources: Vec<String>,

        /// Prefer pre-release versions
        #[arg(long)]
        prerelease: bool,
    },

    /// Show installed and available versions on a volume
    Status {
        /// Mount point of the volume
        #[arg(long)]
        volume: PathBuf,

        /// Compare against pre-release versions
        #[arg(long)]
        prerelease: bool,
    },

    /// List catalog resources
    Resources,

    /// Zip the contents of a volume
    Backup {
        /// Mount point of the volume
        #[arg(long)]
        volume: PathBuf,

        /// Archive to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract a backup over a volume, overwriting existing files
    Restore {
        /// Backup archive
        #[arg(short, long)]
        archive: PathBuf,

        /// Mount point of the volume
        #[arg(long)]
        volume: PathBuf,
    },

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_dir = ConfigFile::load().unwrap_or_default().log_dir();
    let _guard = match init_logging(&log_dir, cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{} {}", style("Warning:").yellow(), e);
            None
        }
    };
    info!(version = env!("CARGO_PKG_VERSION"), "empusa starting");

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{} {}", style("Error:").red().bold(), e);
            e.exit_code()
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Install {
            volume,
            resources,
            prerelease,
        } => commands::install::run(InstallArgs {
            volume,
            resources,
            prerelease,
        }),
        Commands::Status { volume, prerelease } => commands::status::run(&volume, prerelease),
        Commands::Resources => commands::resources::run(),
        Commands::Backup { volume, output } => commands::backup::run_backup(&volume, &output),
        Commands::Restore { archive, volume } => commands::backup::run_restore(&archive, &volume),
        Commands::Config { command } => commands::config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install_with_resources() {
        let cli = Cli::parse_from([
            "empusa", "-v", "install", "--volume", "/mnt/sd", "-r", "hekate", "-r", "atmosphere",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Install {
                volume,
                resources,
                prerelease,
            } => {
                assert_eq!(volume, PathBuf::from("/mnt/sd"));
                assert_eq!(resources, vec!["hekate", "atmosphere"]);
                assert!(!prerelease);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
