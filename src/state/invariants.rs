//! State invariants - sanity checks that detect bugs.
//!
//! Executed actions validate before mutating, so these should never
//! trigger on a state produced by the engine. A violation means a bug or
//! a corrupted state document.

use crate::state::{GameState, PropHome};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all state invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut report = |message: String| violations.push(InvariantViolation { message });
    let content = state.content();

    for solar in state.solar_systems() {
        let props: Vec<_> = solar.props().collect();

        // Occupancy: no two props overlap
        for (i, a) in props.iter().enumerate() {
            for b in &props[i + 1..] {
                if a.location.collides(&b.location) {
                    report(format!(
                        "Props {} and {} overlap in {} at {} / {}",
                        a.id,
                        b.id,
                        solar.id(),
                        a.location,
                        b.location
                    ));
                }
            }
        }

        for prop in &props {
            if !solar.fits(&prop.location) {
                report(format!(
                    "Prop {} at {} leaves the bounds of {}",
                    prop.id,
                    prop.location,
                    solar.id()
                ));
            }
            if state.home(prop.id) != Some(PropHome::Solar(solar.id())) {
                report(format!("Prop {} is missing from the index", prop.id));
            }

            if let Some(ship) = prop.as_ship() {
                match content.ship(&ship.ship_type) {
                    Ok(data) => {
                        if ship.health > data.health || ship.shields > data.shields {
                            report(format!(
                                "Ship {} exceeds its maxima ({} health, {} shields)",
                                prop.id, ship.health, ship.shields
                            ));
                        }
                        if ship.cargo.len() > data.cargo_capacity as usize {
                            report(format!(
                                "Ship {} carries {} ships over capacity {}",
                                prop.id,
                                ship.cargo.len(),
                                data.cargo_capacity
                            ));
                        }
                    }
                    Err(e) => report(format!("Ship {}: {e}", prop.id)),
                }
                for carried in &ship.cargo {
                    match carried.as_ship() {
                        Some(inner) if !inner.cargo.is_empty() => {
                            report(format!("Carried ship {} has its own cargo", carried.id));
                        }
                        None => {
                            report(format!("Carrier {} holds non-ship {}", prop.id, carried.id));
                        }
                        Some(_) => {}
                    }
                }
            }

            if let Some(planet) = prop.as_planet() {
                match content.planet(&planet.planet_type) {
                    Ok(data) => {
                        if planet.health > data.health
                            || planet.shields > planet.max_shields(content)
                        {
                            report(format!("Planet {} exceeds its maxima", prop.id));
                        }
                        if planet.buildings.iter().any(|b| b.slot >= data.slots) {
                            report(format!("Planet {} uses a slot it does not have", prop.id));
                        }
                    }
                    Err(e) => report(format!("Planet {}: {e}", prop.id)),
                }
            }

            if let Some(portal) = prop.as_portal() {
                let paired = state.prop(portal.paired_portal).and_then(|p| p.as_portal());
                let linked_back = paired.is_some_and(|p| p.paired_portal == prop.id)
                    && state.solar_of(portal.paired_portal) == Some(portal.destination);
                if !linked_back {
                    report(format!("Portal {} is not linked back", prop.id));
                }
            }

            if prop.owner.is_some_and(|owner| state.get_player(owner).is_none()) {
                report(format!("Prop {} is owned by an unknown player", prop.id));
            }
        }
    }

    for player in state.players() {
        if !player.resources.is_non_negative() {
            report(format!("Player {} has a negative stockpile", player.id));
        }
    }

    violations
}

/// Assert all state invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("State invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}
