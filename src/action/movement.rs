//! Ship movement: plain moves, portal jumps and cargo transfers.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::action::checks::{
    can_afford, is_free_neighbour, label, owned_ship, pay, reachable_location, require_kind,
    ship_data,
};
use crate::action::{ActionEffect, Applied};
use crate::error::{EngineError, IllegalActionError};
use crate::geometry::{GridLocation, Point};
use crate::pathfinding::{RoutePlan, ShipContext, plan_route};
use crate::state::{GameState, PlayerId, PropCategory, PropHome, PropId};

/// Move a ship to a destination in its reachable set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveShip {
    /// Ship to move.
    pub ship: PropId,
    /// Requested origin of the ship's footprint after the move.
    pub destination: Point,
}

impl MoveShip {
    /// The route this move would take against the current state, falling
    /// back to the closest reachable point when the destination is blocked.
    #[must_use]
    pub fn plan(&self, state: &GameState) -> Option<RoutePlan> {
        let ship = ShipContext::resolve(state, self.ship).ok()?;
        plan_route(
            ship.solar,
            ship.prop.location,
            self.destination,
            ship.data.speed,
            Some(self.ship),
        )
    }

    /// Whether `actor` can still fly `plan`: the ship stands on its start,
    /// the route fits the ship's speed and every footprint on it is free.
    pub(crate) fn can_follow(&self, actor: PlayerId, state: &GameState, plan: &RoutePlan) -> bool {
        owned_ship(state, actor, self.ship).is_some_and(|ship| {
            plan.steps() > 0
                && plan.steps() <= ship.data.speed as usize
                && plan.route.first() == Some(&ship.prop.location)
                && plan
                    .route
                    .iter()
                    .all(|location| ship.solar.is_free_for(location, Some(self.ship)))
        })
    }

    /// Move the ship to the end of `plan`. A fallback route is recorded
    /// with the destination actually reached.
    pub(crate) fn follow(
        &self,
        state: &mut GameState,
        plan: &RoutePlan,
    ) -> Result<Applied, EngineError> {
        let Some(end) = plan.end().filter(|_| plan.steps() > 0) else {
            return Ok(Applied::NoEffect);
        };
        state.relocate_prop(self.ship, end.origin)?;
        if plan.fallback {
            return Ok(Applied::Rewritten(
                Self {
                    ship: self.ship,
                    destination: end.origin,
                }
                .into(),
            ));
        }
        Ok(Applied::AsIssued)
    }
}

impl ActionEffect for MoveShip {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.ship, PropCategory::Ship).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        owned_ship(state, actor, self.ship).is_some_and(|ship| {
            self.destination != ship.prop.location.origin
                && reachable_location(&ship, self.destination).is_some()
        })
    }

    fn apply(&self, _actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        match self.plan(state) {
            Some(plan) => self.follow(state, &plan),
            None => Ok(Applied::NoEffect),
        }
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} moves {} to {}",
            label(state, self.ship),
            self.destination
        )
    }
}

/// Fly a ship through a portal into the linked solar system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JumpShip {
    /// Jumping ship.
    pub ship: PropId,
    /// Portal used.
    pub portal: PropId,
    /// Where the ship stands when entering the portal; must touch it.
    pub approach: Point,
    /// Where the ship appears next to the paired portal. Chosen by the
    /// server when absent.
    #[serde(default)]
    pub exit: Option<Point>,
}

impl JumpShip {
    fn exit_candidates(&self, state: &GameState) -> Vec<GridLocation> {
        let Some(dimension) = ship_data(state, self.ship).map(|data| data.dimension) else {
            return Vec::new();
        };
        let Some(portal) = state.prop(self.portal).and_then(|p| p.as_portal()) else {
            return Vec::new();
        };
        let paired = state.prop(portal.paired_portal);
        let solar = state.solar_system(portal.destination);
        match (paired, solar) {
            (Some(paired), Some(solar)) => solar.neighbours(&paired.location, dimension),
            _ => Vec::new(),
        }
    }

    pub(crate) fn rolled<R: Rng + ?Sized>(&self, state: &GameState, rng: &mut R) -> Self {
        if self.exit.is_some() {
            return *self;
        }
        let exit = self
            .exit_candidates(state)
            .choose(rng)
            .map(|location| location.origin);
        Self { exit, ..*self }
    }
}

impl ActionEffect for JumpShip {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.ship, PropCategory::Ship)?;
        require_kind(state, self.portal, PropCategory::Portal).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let Some(ship) = owned_ship(state, actor, self.ship) else {
            return false;
        };
        let Some(portal_prop) = state.prop(self.portal) else {
            return false;
        };
        let Some(portal) = portal_prop.as_portal() else {
            return false;
        };
        let Some(paired) = state.prop(portal.paired_portal) else {
            return false;
        };
        let Some(exit) = self.exit else {
            return false;
        };
        let exit = GridLocation::new(exit, ship.data.dimension);
        ship.data.can_jump
            && state.solar_of(self.portal) == Some(ship.solar.id())
            && reachable_location(&ship, self.approach)
                .is_some_and(|approach| approach.is_adjacent(&portal_prop.location))
            && can_afford(state, actor, &state.content().jump_cost)
            && is_free_neighbour(state, portal.destination, &exit, &paired.location)
    }

    fn apply(&self, actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let (Some(exit), Some(data)) = (self.exit, ship_data(state, self.ship)) else {
            return Ok(Applied::NoEffect);
        };
        let exit = GridLocation::new(exit, data.dimension);
        let destination = state
            .prop(self.portal)
            .and_then(|p| p.as_portal())
            .map(|portal| portal.destination)
            .ok_or_else(|| {
                EngineError::StateCorruption(format!("portal {} vanished", self.portal))
            })?;
        let cost = state.content().jump_cost.clone();
        pay(state, actor, &cost)?;
        state.transfer_prop(self.ship, destination, exit)?;
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} jumps {} through {}",
            label(state, self.ship),
            label(state, self.portal)
        )
    }
}

/// Dock a ship inside a friendly carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnterCargo {
    /// Ship being loaded.
    pub ship: PropId,
    /// Carrier receiving it.
    pub carrier: PropId,
    /// Where the ship stands when docking; must touch the carrier.
    pub approach: Point,
}

impl ActionEffect for EnterCargo {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.ship, PropCategory::Ship)?;
        require_kind(state, self.carrier, PropCategory::Ship).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let (Some(ship), Some(carrier)) = (
            owned_ship(state, actor, self.ship),
            owned_ship(state, actor, self.carrier),
        ) else {
            return false;
        };
        let loaded = carrier.prop.as_ship().map_or(usize::MAX, |c| c.cargo.len());
        self.ship != self.carrier
            && ship.solar.id() == carrier.solar.id()
            && ship.data.cargo_capacity == 0
            && loaded < carrier.data.cargo_capacity as usize
            && reachable_location(&ship, self.approach)
                .is_some_and(|approach| approach.is_adjacent(&carrier.prop.location))
    }

    fn apply(&self, _actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        state.load_cargo(self.ship, self.carrier)?;
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} loads {} into {}",
            label(state, self.ship),
            label(state, self.carrier)
        )
    }
}

/// Unload a carried ship next to its carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveCargo {
    /// Ship being unloaded.
    pub ship: PropId,
    /// Carrier holding it.
    pub carrier: PropId,
    /// Origin of the unloaded ship; must touch the carrier.
    pub destination: Point,
}

impl ActionEffect for LeaveCargo {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.ship, PropCategory::Ship)?;
        require_kind(state, self.carrier, PropCategory::Ship).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let Some(carrier) = owned_ship(state, actor, self.carrier) else {
            return false;
        };
        let Some(data) = ship_data(state, self.ship) else {
            return false;
        };
        let location = GridLocation::new(self.destination, data.dimension);
        state.home(self.ship) == Some(PropHome::Cargo(self.carrier))
            && state.prop(self.ship).is_some_and(|p| p.is_owned_by(actor))
            && is_free_neighbour(state, carrier.solar.id(), &location, &carrier.prop.location)
    }

    fn apply(&self, _actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let (Some(data), Some(solar)) = (ship_data(state, self.ship), state.solar_of(self.carrier))
        else {
            return Ok(Applied::NoEffect);
        };
        let location = GridLocation::new(self.destination, data.dimension);
        state.transfer_prop(self.ship, solar, location)?;
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} unloads {} from {} at {}",
            label(state, self.ship),
            label(state, self.carrier),
            self.destination
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::fixtures::{at, galaxy};
    use crate::action::{Action, Outcome};
    use crate::geometry::Dimension;
    use crate::state::SolarId;

    #[test]
    fn test_move_within_reach() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "fighter", at(0, 0)).unwrap();
        let action = Action::new(1, MoveShip { ship, destination: at(2, 2) }, &state).unwrap();
        assert!(matches!(action.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(state.prop(ship).unwrap().location.origin, at(2, 2));
    }

    #[test]
    fn test_move_beyond_speed_dropped() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "fighter", at(0, 0)).unwrap();
        let action = Action::new(1, MoveShip { ship, destination: at(4, 1) }, &state).unwrap();
        assert_eq!(action.execute(&mut state).unwrap(), Outcome::Dropped);
        assert_eq!(state.prop(ship).unwrap().location.origin, at(0, 0));
    }

    #[test]
    fn test_move_other_players_ship_dropped() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 2, "fighter", at(0, 0)).unwrap();
        let action = Action::new(1, MoveShip { ship, destination: at(1, 0) }, &state).unwrap();
        assert_eq!(action.execute(&mut state).unwrap(), Outcome::Dropped);
    }

    #[test]
    fn test_move_onto_occupied_cell_dropped() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "fighter", at(0, 0)).unwrap();
        state.spawn_ship(solar, 2, "scout", at(2, 0)).unwrap();
        let action = Action::new(1, MoveShip { ship, destination: at(2, 0) }, &state).unwrap();
        assert_eq!(action.execute(&mut state).unwrap(), Outcome::Dropped);
    }

    fn portal_pair(state: &mut GameState, solar: SolarId) -> (PropId, SolarId) {
        let far = state.add_solar_system("Vega", Dimension::new(10, 10).unwrap());
        let (near, _) = state.link_portals((solar, at(5, 0)), (far, at(0, 5))).unwrap();
        (near, far)
    }

    #[test]
    fn test_jump_through_portal() {
        let (mut state, solar) = galaxy();
        let (portal, far) = portal_pair(&mut state, solar);
        let ship = state.spawn_ship(solar, 1, "fighter", at(3, 0)).unwrap();
        let jump = JumpShip { ship, portal, approach: at(4, 0), exit: Some(at(1, 5)) };
        let action = Action::new(1, jump, &state).unwrap();
        assert!(matches!(action.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(state.solar_of(ship), Some(far));
        assert_eq!(state.prop(ship).unwrap().location.origin, at(1, 5));
        assert_eq!(state.get_player(1).unwrap().resources.get("energy"), 195);
    }

    #[test]
    fn test_jump_exit_rolled_server_side() {
        let (mut state, solar) = galaxy();
        let (portal, far) = portal_pair(&mut state, solar);
        let ship = state.spawn_ship(solar, 1, "fighter", at(4, 0)).unwrap();
        let jump = JumpShip { ship, portal, approach: at(4, 0), exit: None };
        let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(3);
        let rolled = jump.rolled(&state, &mut rng);
        let exit = rolled.exit.unwrap();
        let paired = state.solar_system(far).unwrap().props().next().unwrap().location;
        assert!(GridLocation::unit(exit.x, exit.y).is_adjacent(&paired));
        assert!(rolled.is_valid(1, &state));
        assert!(!jump.is_valid(1, &state));
    }

    #[test]
    fn test_jump_requires_touching_portal() {
        let (mut state, solar) = galaxy();
        let (portal, _) = portal_pair(&mut state, solar);
        let ship = state.spawn_ship(solar, 1, "fighter", at(0, 3)).unwrap();
        let jump = JumpShip { ship, portal, approach: at(1, 3), exit: Some(at(1, 5)) };
        assert!(!jump.is_valid(1, &state));
    }

    #[test]
    fn test_cargo_load_and_unload() {
        let (mut state, solar) = galaxy();
        let carrier = state.spawn_ship(solar, 1, "cruiser", at(5, 5)).unwrap();
        let scout = state.spawn_ship(solar, 1, "scout", at(0, 5)).unwrap();

        let enter = EnterCargo {
            ship: scout,
            carrier,
            approach: at(4, 5),
        };
        let enter = Action::new(1, enter, &state).unwrap();
        assert!(matches!(enter.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(state.home(scout), Some(PropHome::Cargo(carrier)));

        let leave = |destination| LeaveCargo {
            ship: scout,
            carrier,
            destination,
        };
        assert!(!leave(at(9, 9)).is_valid(1, &state));
        let leave = Action::new(1, leave(at(7, 6)), &state).unwrap();
        assert!(matches!(leave.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(state.prop(scout).unwrap().location.origin, at(7, 6));
    }

    #[test]
    fn test_carrier_cannot_board_carrier() {
        let (mut state, solar) = galaxy();
        let big = state.spawn_ship(solar, 1, "cruiser", at(0, 0)).unwrap();
        let other = state.spawn_ship(solar, 1, "cruiser", at(2, 0)).unwrap();
        let enter = EnterCargo { ship: other, carrier: big, approach: at(2, 0) };
        assert!(!enter.is_valid(1, &state));
    }
}
