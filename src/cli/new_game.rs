//! Galaxy generation command implementation.

use std::path::Path;

use voidreach::{ContentTables, GalaxyConfig, generate_galaxy};

use super::{CliError, write_or_print};

/// Execute the new-game command.
///
/// # Errors
///
/// Returns an error if the parameters are out of range or the state cannot
/// be written.
pub(crate) fn execute(
    seed: u64,
    players: usize,
    systems: usize,
    size: i32,
    neutral_planets: usize,
    out: Option<&Path>,
) -> Result<(), CliError> {
    let config = GalaxyConfig {
        seed,
        players,
        systems,
        system_size: size,
        neutral_planets,
        ..GalaxyConfig::default()
    };

    let state = generate_galaxy(&config, ContentTables::builtin())?;
    write_or_print(out, &state.to_json()?)?;

    if let Some(path) = out {
        println!(
            "Generated {} systems for {} players (seed {seed}) -> {}",
            state.solar_systems().count(),
            state.players().len(),
            path.display()
        );
    }

    Ok(())
}
