//! Movement preview commands: reachable cells and routes.

use std::collections::BTreeSet;
use std::path::Path;

use voidreach::state::SolarSystem;
use voidreach::{ContentTables, EngineConfig, GridLocation, Point, PropId, TurnEngine};

use super::output::{JsonCells, render_map, route_points};
use super::{CliError, OutputFormat, load_state};

fn open(state_path: &Path) -> Result<TurnEngine, CliError> {
    let state = load_state(state_path, ContentTables::builtin())?;
    Ok(TurnEngine::new(state, EngineConfig::builtin()))
}

/// The solar system `ship` sits in.
fn solar_of(engine: &TurnEngine, ship: PropId) -> Option<&SolarSystem> {
    let state = engine.state();
    state.solar_of(ship).and_then(|id| state.solar_system(id))
}

/// Execute the reachable command.
///
/// # Errors
///
/// Returns an error if the state cannot be loaded or `ship` is not a ship
/// on a grid.
pub(crate) fn reachable(
    state_path: &Path,
    ship: u32,
    format: OutputFormat,
) -> Result<(), CliError> {
    let engine = open(state_path)?;
    let ship = PropId(ship);
    let cells = engine.reachable_set(ship)?;

    match format {
        OutputFormat::Text => {
            println!("Ship {ship} can reach {} cells", cells.len());
            if let Some(solar) = solar_of(&engine, ship) {
                println!();
                print!("{}", render_map(solar, ship, &cells));
            }
        }
        OutputFormat::Json => {
            let result = JsonCells {
                ship,
                cells: cells.into_iter().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// Execute the route command.
///
/// # Errors
///
/// Returns an error if the state cannot be loaded, `ship` is not a ship on
/// a grid, or no route exists.
pub(crate) fn route(
    state_path: &Path,
    ship: u32,
    x: i32,
    y: i32,
    format: OutputFormat,
) -> Result<(), CliError> {
    let engine = open(state_path)?;
    let ship = PropId(ship);
    let destination = Point::new(x, y);
    let route = engine
        .find_route(ship, destination)?
        .ok_or_else(|| CliError::new(format!("No route for ship {ship} to {destination}")))?;
    let points = route_points(&route);

    match format {
        OutputFormat::Text => {
            let steps = points.len().saturating_sub(1);
            println!("Route for ship {ship} to {destination}: {steps} steps");
            let path: Vec<String> = points.iter().map(ToString::to_string).collect();
            println!("  {}", path.join(" -> "));
            if let Some(solar) = solar_of(&engine, ship) {
                let highlight: BTreeSet<Point> =
                    route.iter().flat_map(GridLocation::points).collect();
                println!();
                print!("{}", render_map(solar, ship, &highlight));
            }
        }
        OutputFormat::Json => {
            let result = JsonCells { ship, cells: points };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
