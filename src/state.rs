//! Authoritative game state.
//!
//! - Players and their resource stockpiles
//! - Solar systems holding positioned props
//! - Props: ships, planets (with buildings), stars, portals
//! - ID issuing and the prop-to-container index

mod building;
mod game_state;
mod invariants;
mod player;
mod prop;
mod resources;
mod solar;

pub use building::{Building, BuildingId, ShipConstruction};
pub use game_state::{GameState, PropHome};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use player::{Player, PlayerId};
pub use prop::{Planet, Portal, Prop, PropCategory, PropId, PropKind, Ship, Star};
pub use resources::ResourceAmount;
pub use solar::{SolarId, SolarSystem};
