//! Output formatting utilities for CLI.

use std::collections::BTreeSet;

use serde::Serialize;
use voidreach::geometry::GridLocation;
use voidreach::state::{PropCategory, SolarSystem};
use voidreach::{GameState, Point, PropId, Turn};

/// JSON-serializable resolution result.
#[derive(Debug, Serialize)]
pub(super) struct JsonResolution {
    /// Turn number after resolution.
    pub(super) turn: u32,
    /// Actions submitted.
    pub(super) submitted: usize,
    /// The resolved turn, including income.
    pub(super) resolved: serde_json::Value,
}

/// JSON-serializable preview result.
#[derive(Debug, Serialize)]
pub(super) struct JsonCells {
    /// Ship the preview was computed for.
    pub(super) ship: PropId,
    /// Cells in order.
    pub(super) cells: Vec<Point>,
}

/// Format a resolved turn as human-readable text.
pub(super) fn format_turn(turn: &Turn, submitted: usize, state: &GameState) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Turn {} resolved: {} of {submitted} submitted actions applied\n",
        state.turn,
        turn.len()
    ));
    for action in turn.actions() {
        output.push_str(&format!("  [{}] {}\n", action.kind().tag(), action.describe(state)));
    }

    output.push('\n');
    for player in state.players() {
        let stock: Vec<String> = player
            .resources
            .iter()
            .map(|(name, amount)| format!("{name} {amount}"))
            .collect();
        output.push_str(&format!(
            "  Player {} ({}): {}\n",
            player.id,
            player.name,
            stock.join(", ")
        ));
    }

    output
}

/// Render a solar system as a character grid.
///
/// `S` is the ship the preview is about, `*` a highlighted cell, `.` free
/// space. Other props show the first letter of their kind.
pub(super) fn render_map(solar: &SolarSystem, ship: PropId, highlight: &BTreeSet<Point>) -> String {
    let dimension = solar.dimension();
    let mut output = format!("{} ({}x{})\n", solar.name(), dimension.width(), dimension.height());

    for y in 0..dimension.height() {
        for x in 0..dimension.width() {
            let point = Point::new(x, y);
            let symbol = match solar.prop_at(point) {
                Some(prop) if prop.id == ship => 'S',
                Some(prop) => match prop.category() {
                    PropCategory::Ship => 's',
                    PropCategory::Planet => 'p',
                    PropCategory::Star => '@',
                    PropCategory::Portal => 'o',
                },
                None if highlight.contains(&point) => '*',
                None => '.',
            };
            output.push(symbol);
        }
        output.push('\n');
    }

    output
}

/// Origins of a route, in travel order.
pub(super) fn route_points(route: &[GridLocation]) -> Vec<Point> {
    route.iter().map(|location| location.origin).collect()
}
