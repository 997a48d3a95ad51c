//! Pathfinding over solar system grids.
//!
//! Movement is 4-connected and one cell per unit of speed. Two searches
//! are provided:
//! - [`reachable_set`]: every legal destination within a speed budget
//! - [`find_route`]: a concrete shortest route (A*, Manhattan heuristic)
//!
//! [`ShipPath`] turns a route into the set of cells it sweeps, which is
//! what movement conflict resolution compares.

mod reachable;
mod route;
mod sweep;

pub use reachable::{reachable_set, ship_reachable_set};
pub use route::{RoutePlan, find_route, plan_route};
pub use sweep::ShipPath;

use crate::content::ShipData;
use crate::error::IllegalActionError;
use crate::state::{GameState, Prop, PropCategory, PropId, SolarSystem};

/// A ship resolved for movement: the prop, its stats and its solar system.
#[derive(Debug, Clone, Copy)]
pub struct ShipContext<'a> {
    /// The ship prop.
    pub prop: &'a Prop,
    /// Its content data.
    pub data: &'a ShipData,
    /// The solar system it sits in.
    pub solar: &'a SolarSystem,
}

impl<'a> ShipContext<'a> {
    /// Resolve a ship that sits directly on a grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the prop is missing, not a ship, carried as
    /// cargo, or of an unknown type.
    pub fn resolve(state: &'a GameState, ship: PropId) -> Result<Self, IllegalActionError> {
        let prop = state.prop(ship).ok_or(IllegalActionError::MissingProp(ship))?;
        let payload = prop.as_ship().ok_or(IllegalActionError::WrongPropKind {
            prop: ship,
            expected: PropCategory::Ship,
            found: prop.category(),
        })?;
        let data = state.content().ship(&payload.ship_type)?;
        let solar = state
            .solar_of(ship)
            .and_then(|id| state.solar_system(id))
            .ok_or(IllegalActionError::MissingProp(ship))?;
        Ok(Self { prop, data, solar })
    }
}
