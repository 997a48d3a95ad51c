//! Turn resolution command implementation.

use std::path::Path;

use voidreach::{EngineConfig, TurnEngine};

use super::output::{JsonResolution, format_turn};
use super::{CliError, OutputFormat, load_state, read, write_or_print};

/// Execute the resolve command.
///
/// # Errors
///
/// Returns an error if any input cannot be read, the turn document is
/// malformed, or resolution hits a fatal condition.
pub(crate) fn execute(
    state_path: &Path,
    turn_path: &Path,
    config: Option<&Path>,
    out: Option<&Path>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let config = match config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::builtin(),
    };
    let state = load_state(state_path, config.load_content()?)?;

    let mut engine = TurnEngine::new(state, config);
    let turn = engine.decode_turn_json(&read(turn_path)?)?;
    let submitted = turn.len();
    let resolved = engine.resolve_turn(turn)?;

    if out.is_some() {
        write_or_print(out, &engine.state().to_json()?)?;
    }

    match format {
        OutputFormat::Text => {
            print!("{}", format_turn(&resolved, submitted, engine.state()));
            if let Some(path) = out {
                println!("\nState written to {}", path.display());
            }
        }
        OutputFormat::Json => {
            let result = JsonResolution {
                turn: engine.state().turn,
                submitted,
                resolved: resolved.encode()?,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
