//! CLI error type.

use std::fmt;
use std::io;
use std::path::PathBuf;

use binhost::config::ConfigError;
use binhost::forge::ForgeError;
use binhost::package::LocateError;
use binhost::publisher::PublishError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config(String),
    /// The archive for the current build could not be found.
    Locate(LocateError),
    /// The GitHub client could not be created.
    Forge(ForgeError),
    /// A publish step failed.
    Publish(PublishError),
    /// A file could not be read.
    Read { path: PathBuf, source: io::Error },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Report the error and terminate the process.
    pub fn exit(&self) -> ! {
        tracing::error!("{}", self);
        std::process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Locate(e) => write!(f, "Package lookup failed: {}", e),
            CliError::Forge(e) => write!(f, "GitHub client error: {}", e),
            CliError::Publish(e) => write!(f, "Publish failed: {}", e),
            CliError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Locate(e) => Some(e),
            CliError::Forge(e) => Some(e),
            CliError::Publish(e) => Some(e),
            CliError::Read { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LocateError> for CliError {
    fn from(e: LocateError) -> Self {
        CliError::Locate(e)
    }
}

impl From<ForgeError> for CliError {
    fn from(e: ForgeError) -> Self {
        CliError::Forge(e)
    }
}

impl From<PublishError> for CliError {
    fn from(e: PublishError) -> Self {
        CliError::Publish(e)
    }
}
