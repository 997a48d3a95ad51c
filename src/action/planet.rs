//! Planet ownership and buildings.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::action::checks::{
    can_afford, corrupt, label, owned_planet, owned_ship, pay, planet, reachable_location,
    require_kind, require_slot,
};
use crate::action::{ActionEffect, Applied};
use crate::error::{EngineError, IllegalActionError};
use crate::geometry::Point;
use crate::state::{Building, GameState, PlayerId, Prop, PropCategory, PropId, ResourceAmount};

/// Fly next to a neutral planet and claim it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapturePlanet {
    /// Capturing ship.
    pub ship: PropId,
    /// Neutral planet.
    pub planet: PropId,
    /// Where the ship ends up; must touch the planet.
    pub destination: Point,
}

impl ActionEffect for CapturePlanet {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.ship, PropCategory::Ship)?;
        require_kind(state, self.planet, PropCategory::Planet).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let (Some(ship), Some(target)) =
            (owned_ship(state, actor, self.ship), planet(state, self.planet))
        else {
            return false;
        };
        ship.data.can_capture
            && target.prop.owner.is_none()
            && target.solar == ship.solar.id()
            && reachable_location(&ship, self.destination)
                .is_some_and(|end| end.is_adjacent(&target.prop.location))
    }

    fn apply(&self, actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let current = state
            .prop(self.ship)
            .map(|p| p.location.origin)
            .ok_or_else(|| corrupt(format!("capturing ship {} vanished", self.ship)))?;
        if current != self.destination {
            state.relocate_prop(self.ship, self.destination)?;
        }
        state
            .prop_mut(self.planet)
            .ok_or_else(|| corrupt(format!("captured planet {} vanished", self.planet)))?
            .owner = Some(actor);
        info!(planet = %self.planet, player = actor, "planet captured");
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} captures {} with {}",
            label(state, self.planet),
            label(state, self.ship)
        )
    }
}

/// Invest one turn of construction into a building slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncrementBuildingConstruction {
    /// Host planet.
    pub planet: PropId,
    /// Slot index.
    pub slot: u32,
    /// Building type key.
    pub building_type: String,
}

impl IncrementBuildingConstruction {
    /// What the next turn of construction costs, and the build time.
    fn installment(&self, state: &GameState) -> Option<(ResourceAmount, u32)> {
        let data = state.content().building(&self.building_type).ok()?;
        let done = state
            .prop(self.planet)
            .and_then(Prop::as_planet)
            .and_then(|p| p.building(self.slot))
            .map_or(0, |building| building.progress);
        Some((data.cost.installment(data.build_time, done + 1), data.build_time))
    }
}

impl ActionEffect for IncrementBuildingConstruction {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_slot(state, self.planet, self.slot)?;
        state.content().building(&self.building_type).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let (Some(host), Some((installment, build_time))) =
            (owned_planet(state, actor, self.planet), self.installment(state))
        else {
            return false;
        };
        let slot_ready = host.planet.building(self.slot).is_none_or(|building| {
            building.building_type == self.building_type && building.progress < build_time
        });
        slot_ready && can_afford(state, actor, &installment)
    }

    fn apply(&self, actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let (installment, _) = self
            .installment(state)
            .ok_or_else(|| corrupt(format!("building type {} vanished", self.building_type)))?;
        let fresh = state
            .prop(self.planet)
            .and_then(Prop::as_planet)
            .is_some_and(|p| p.building(self.slot).is_none());
        let id = fresh.then(|| state.issue_building_id());
        pay(state, actor, &installment)?;
        let host = state
            .prop_mut(self.planet)
            .and_then(Prop::as_planet_mut)
            .ok_or_else(|| corrupt(format!("planet {} vanished", self.planet)))?;
        if let Some(id) = id {
            host.set_building(Building::new(id, self.slot, self.building_type.as_str()));
        }
        if let Some(building) = host.building_mut(self.slot) {
            building.progress += 1;
        }
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} builds {} in slot {} of {}",
            self.building_type,
            self.slot,
            label(state, self.planet)
        )
    }
}

/// Tear down the building in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestroyBuilding {
    /// Host planet.
    pub planet: PropId,
    /// Slot index.
    pub slot: u32,
}

impl ActionEffect for DestroyBuilding {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_slot(state, self.planet, self.slot)
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        owned_planet(state, actor, self.planet)
            .is_some_and(|host| host.planet.building(self.slot).is_some())
    }

    fn apply(&self, _actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let content = state.content_handle();
        let host = state
            .prop_mut(self.planet)
            .and_then(Prop::as_planet_mut)
            .ok_or_else(|| corrupt(format!("planet {} vanished", self.planet)))?;
        host.remove_building(self.slot);
        host.shields = host.shields.min(host.max_shields(&content));
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} demolishes slot {} of {}",
            self.slot,
            label(state, self.planet)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::fixtures::{at, galaxy};
    use crate::action::{Action, Outcome};

    fn capture(ship: PropId, planet: PropId, destination: Point) -> CapturePlanet {
        CapturePlanet {
            ship,
            planet,
            destination,
        }
    }

    fn build(home: PropId, slot: u32, building_type: &str) -> IncrementBuildingConstruction {
        IncrementBuildingConstruction {
            planet: home,
            slot,
            building_type: building_type.into(),
        }
    }

    #[test]
    fn test_capture_neutral_planet() {
        let (mut state, solar) = galaxy();
        let scout = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let target = state.spawn_planet(solar, None, "terrestrial", at(5, 0)).unwrap();
        let capture = CapturePlanet { ship: scout, planet: target, destination: at(4, 0) };
        let action = Action::new(1, capture, &state).unwrap();
        assert!(matches!(action.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(state.prop(target).unwrap().owner, Some(1));
        assert_eq!(state.prop(scout).unwrap().location.origin, at(4, 0));
    }

    #[test]
    fn test_capture_requires_neutral_and_contact() {
        let (mut state, solar) = galaxy();
        let scout = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let owned = state.spawn_planet(solar, Some(2), "barren", at(5, 0)).unwrap();
        let neutral = state.spawn_planet(solar, None, "barren", at(3, 3)).unwrap();
        assert!(!capture(scout, owned, at(4, 0)).is_valid(1, &state));
        assert!(!capture(scout, neutral, at(1, 1)).is_valid(1, &state));
        assert!(capture(scout, neutral, at(2, 3)).is_valid(1, &state));
    }

    #[test]
    fn test_fighter_cannot_capture() {
        let (mut state, solar) = galaxy();
        let fighter = state.spawn_ship(solar, 1, "fighter", at(0, 0)).unwrap();
        let neutral = state.spawn_planet(solar, None, "barren", at(2, 0)).unwrap();
        assert!(!capture(fighter, neutral, at(1, 0)).is_valid(1, &state));
    }

    #[test]
    fn test_building_construction_progress() {
        let (mut state, solar) = galaxy();
        let home = state.spawn_planet(solar, Some(1), "terrestrial", at(0, 0)).unwrap();
        let action = Action::new(1, build(home, 1, "mine"), &state).unwrap();

        assert!(matches!(action.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert!(matches!(action.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(action.execute(&mut state).unwrap(), Outcome::Dropped);

        let planet = state.prop(home).unwrap().as_planet().unwrap();
        assert_eq!(planet.building(1).unwrap().progress, 2);
        assert_eq!(state.get_player(1).unwrap().resources.get("metal"), 470);
        assert_eq!(planet.income(state.content()).get("metal"), 10);
    }

    #[test]
    fn test_last_building_installment_pays_remainder() {
        let (mut state, solar) = galaxy();
        let home = state.spawn_planet(solar, Some(1), "terrestrial", at(0, 0)).unwrap();
        let action = Action::new(1, build(home, 1, "reactor"), &state).unwrap();
        let stock = |state: &GameState, name: &str| {
            state.get_player(1).unwrap().resources.get(name)
        };

        action.execute(&mut state).unwrap();
        action.execute(&mut state).unwrap();
        assert_eq!(stock(&state, "metal"), 474);
        assert_eq!(stock(&state, "energy"), 194);

        action.execute(&mut state).unwrap();
        assert_eq!(stock(&state, "metal"), 460);
        assert_eq!(stock(&state, "energy"), 190);
        let planet = state.prop(home).unwrap().as_planet().unwrap();
        assert_eq!(planet.building(1).unwrap().progress, 3);
    }

    #[test]
    fn test_building_slot_must_exist() {
        let (mut state, solar) = galaxy();
        let home = state.spawn_planet(solar, Some(1), "barren", at(0, 0)).unwrap();
        assert_eq!(
            Action::new(1, build(home, 1, "mine"), &state).unwrap_err(),
            IllegalActionError::InvalidSlot { planet: home, slot: 1 }
        );
    }

    #[test]
    fn test_other_building_type_blocks_slot() {
        let (mut state, solar) = galaxy();
        let home = state.spawn_planet(solar, Some(1), "terrestrial", at(0, 0)).unwrap();
        Action::new(1, build(home, 0, "mine"), &state).unwrap().execute(&mut state).unwrap();
        assert!(!build(home, 0, "reactor").is_valid(1, &state));
    }

    #[test]
    fn test_destroy_building_clamps_shields() {
        let (mut state, solar) = galaxy();
        let home = state.spawn_planet(solar, Some(1), "terrestrial", at(0, 0)).unwrap();
        {
            let planet = state.prop_mut(home).unwrap().as_planet_mut().unwrap();
            let mut generator = Building::new(crate::state::BuildingId(7), 2, "shield_generator");
            generator.progress = 3;
            planet.set_building(generator);
            planet.shields = 110;
        }
        let action = Action::new(1, DestroyBuilding { planet: home, slot: 2 }, &state).unwrap();
        assert!(matches!(action.execute(&mut state).unwrap(), Outcome::Applied(_)));
        let planet = state.prop(home).unwrap().as_planet().unwrap();
        assert!(planet.building(2).is_none());
        assert_eq!(planet.shields, 50);
        assert_eq!(action.execute(&mut state).unwrap(), Outcome::Dropped);
    }
}
