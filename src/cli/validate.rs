//! State validation command implementation.

use std::path::Path;

use voidreach::state::check_invariants;
use voidreach::{ContentTables, GameState};

use super::{CliError, read};

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the state is
/// inconsistent.
pub(crate) fn execute(state_path: &Path) -> Result<(), CliError> {
    let json = read(state_path)?;

    println!("Validating: {}", state_path.display());
    println!();

    let parsed = serde_json::from_str::<serde_json::Value>(&json);
    print_check("JSON syntax", parsed.is_ok());
    parsed?;

    let state = GameState::from_json(&json, ContentTables::builtin());
    print_check("State structure and occupancy", state.is_ok());
    let state = state?;

    let violations = check_invariants(&state);
    print_check("Invariants", violations.is_empty());
    if let Some(first) = violations.first() {
        for violation in &violations {
            println!("    {violation}");
        }
        return Err(CliError::new(first.to_string()));
    }

    println!();
    println!("Summary:");
    println!("  Turn:          {}", state.turn);
    println!("  Players:       {}", state.players().len());
    println!("  Solar systems: {}", state.solar_systems().count());
    println!("  Props:         {}", state.props().count());
    if let Some(winner) = state.winner() {
        println!("  Winner:        Player {winner}");
    }

    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
