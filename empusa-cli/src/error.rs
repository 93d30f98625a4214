//! CLI error type and exit codes.

use std::fmt;
use std::process::ExitCode;

use empusa::config::ConfigError;
use empusa::logging::LoggingError;
use empusa::manager::ManagerError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or missing configuration.
    Config(String),

    /// Library operation failed.
    Manager(ManagerError),

    /// Log setup failed.
    Logging(LoggingError),

    /// A requested resource is not in the catalog.
    UnknownResource(String),

    /// The async runtime could not be started.
    Runtime(String),

    /// A batch finished with failed resources.
    BatchFailed { failed: usize, total: usize },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Config(_) | CliError::UnknownResource(_) => ExitCode::from(2),
            CliError::BatchFailed { .. } => ExitCode::from(3),
            _ => ExitCode::FAILURE,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Manager(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::UnknownResource(name) => write!(
                f,
                "Unknown resource '{}'. Use 'empusa resources' to see available resources.",
                name
            ),
            CliError::Runtime(msg) => write!(f, "Failed to start runtime: {}", msg),
            CliError::BatchFailed { failed, total } => {
                write!(f, "{} of {} resources failed to install", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Manager(e) => Some(e),
            CliError::Logging(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ManagerError> for CliError {
    fn from(e: ManagerError) -> Self {
        CliError::Manager(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}
