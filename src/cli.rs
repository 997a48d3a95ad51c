//! CLI command implementations for Voidreach.

pub(crate) mod new_game;
pub(crate) mod preview;
pub(crate) mod resolve;
pub(crate) mod validate;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use voidreach::{ContentTables, GameState};

/// Output format for commands that print results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<voidreach::EngineError> for CliError {
    fn from(e: voidreach::EngineError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<voidreach::ConfigError> for CliError {
    fn from(e: voidreach::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<voidreach::GalaxyError> for CliError {
    fn from(e: voidreach::GalaxyError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<voidreach::IllegalActionError> for CliError {
    fn from(e: voidreach::IllegalActionError) -> Self {
        Self::new(e.to_string())
    }
}

/// Read a file, naming it in the error.
fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))
}

/// Load a game state saved as JSON.
pub(crate) fn load_state(
    path: &Path,
    content: Arc<ContentTables>,
) -> Result<GameState, CliError> {
    Ok(GameState::from_json(&read(path)?, content)?)
}

/// Write `contents` to `path`, or stdout when absent.
pub(crate) fn write_or_print(path: Option<&Path>, contents: &str) -> Result<(), CliError> {
    match path {
        Some(path) => fs::write(path, contents)
            .map_err(|e| CliError::new(format!("Failed to write {}: {e}", path.display()))),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}
