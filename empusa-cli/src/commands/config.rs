//! Configuration management CLI commands.
//!
//! `config get`, `config set`, `config list` and `config path` read and edit
//! `~/.empusa/config.ini` without opening it by hand.

use clap::Subcommand;
use empusa::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Key in section.key form (e.g. network.timeout_secs)
        key: String,
    },

    /// Set a configuration value (an empty value clears optional keys)
    Set {
        /// Key in section.key form (e.g. general.prefer_prerelease)
        key: String,

        /// New value
        value: String,
    },

    /// List every setting
    List,

    /// Print the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = parse_key(&key)?;
            let config = ConfigFile::load()?;
            println!("{}", display_value(&key.get(&config)));
        }
        ConfigCommands::Set { key, value } => {
            let key = parse_key(&key)?;
            let mut config = ConfigFile::load()?;
            key.set(&mut config, &value)?;
            config.save()?;
            println!("Set {} = {}", key, display_value(&key.get(&config)));
        }
        ConfigCommands::List => print_all(&ConfigFile::load()?),
        ConfigCommands::Path => println!("{}", config_file_path().display()),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'empusa config list' to see available keys.",
            key
        ))
    })
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn print_all(config: &ConfigFile) {
    let mut section = "";
    for key in ConfigKey::all() {
        if key.section() != section {
            if !section.is_empty() {
                println!();
            }
            section = key.section();
            println!("[{}]", section);
        }
        println!("  {} = {}", key.key_name(), display_value(&key.get(config)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("network.timeout_secs").unwrap(), ConfigKey::NetworkTimeoutSecs);
        assert!(matches!(parse_key("network.proxy"), Err(CliError::Config(_))));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(""), "(not set)");
        assert_eq!(display_value("30"), "30");
    }
}
