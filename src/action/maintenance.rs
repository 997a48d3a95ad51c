//! Server-issued upkeep: stockpile changes and regeneration.

use serde::{Deserialize, Serialize};

use crate::action::checks::{corrupt, label, planet, require_kind, ship_data};
use crate::action::{ActionEffect, Applied};
use crate::error::{EngineError, IllegalActionError};
use crate::state::{GameState, PlayerId, Prop, PropCategory, PropId};

/// Add a signed amount to one of the actor's stockpiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeResource {
    /// Resource name.
    pub resource: String,
    /// Signed change.
    pub amount: i64,
}

impl ActionEffect for ChangeResource {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        if state.content().has_resource(&self.resource) {
            Ok(())
        } else {
            Err(IllegalActionError::UnknownResource(self.resource.clone()))
        }
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        state
            .get_player(actor)
            .and_then(|p| p.resources.get(&self.resource).checked_add(self.amount))
            .is_some_and(|total| total >= 0)
    }

    fn apply(&self, actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        state
            .get_player_mut(actor)
            .ok_or_else(|| corrupt(format!("player {actor} vanished")))?
            .resources
            .adjust(&self.resource, self.amount);
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, _state: &GameState) -> String {
        format!("player {actor} receives {} {}", self.amount, self.resource)
    }
}

/// Restore a ship's health and shields by its regeneration rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegenerateShip {
    /// Ship to repair.
    pub ship: PropId,
}

impl ActionEffect for RegenerateShip {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.ship, PropCategory::Ship).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        state.prop(self.ship).is_some_and(|p| p.is_owned_by(actor))
    }

    fn apply(&self, _actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let data = ship_data(state, self.ship)
            .cloned()
            .ok_or_else(|| corrupt(format!("ship {} vanished", self.ship)))?;
        let ship = state
            .prop_mut(self.ship)
            .and_then(Prop::as_ship_mut)
            .ok_or_else(|| corrupt(format!("ship {} vanished", self.ship)))?;
        let health = ship.health.saturating_add(data.health_regen).min(data.health);
        let shields = ship.shields.saturating_add(data.shield_regen).min(data.shields);
        if (health, shields) == (ship.health, ship.shields) {
            return Ok(Applied::NoEffect);
        }
        ship.health = health;
        ship.shields = shields;
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!("player {actor} repairs {}", label(state, self.ship))
    }
}

/// Restore a planet's health and shields by its regeneration rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegeneratePlanet {
    /// Planet to repair.
    pub planet: PropId,
}

impl ActionEffect for RegeneratePlanet {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.planet, PropCategory::Planet).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        planet(state, self.planet).is_some_and(|host| host.prop.is_owned_by(actor))
    }

    fn apply(&self, _actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let content = state.content_handle();
        let host = state
            .prop_mut(self.planet)
            .and_then(Prop::as_planet_mut)
            .ok_or_else(|| corrupt(format!("planet {} vanished", self.planet)))?;
        let data = content.planet(&host.planet_type)?;
        let health = host.health.saturating_add(data.health_regen).min(data.health);
        let shields = host
            .shields
            .saturating_add(data.shield_regen)
            .min(host.max_shields(&content));
        if (health, shields) == (host.health, host.shields) {
            return Ok(Applied::NoEffect);
        }
        host.health = health;
        host.shields = shields;
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!("player {actor} repairs {}", label(state, self.planet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::fixtures::{at, galaxy};
    use crate::action::{Action, Outcome};
    use crate::state::{Building, BuildingId};

    fn change(resource: &str, amount: i64) -> ChangeResource {
        ChangeResource {
            resource: resource.into(),
            amount,
        }
    }

    #[test]
    fn test_change_resource_cannot_go_negative() {
        let (mut state, _) = galaxy();
        let spend = Action::new(1, change("energy", -150), &state).unwrap();
        assert!(matches!(spend.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(spend.execute(&mut state).unwrap(), Outcome::Dropped);
        assert_eq!(state.get_player(1).unwrap().resources.get("energy"), 50);
    }

    #[test]
    fn test_change_resource_unknown_name() {
        let (state, _) = galaxy();
        let err = Action::new(1, change("spice", 1), &state).unwrap_err();
        assert_eq!(err, IllegalActionError::UnknownResource("spice".into()));
    }

    #[test]
    fn test_zero_change_is_recorded() {
        let (mut state, _) = galaxy();
        let nothing = Action::new(2, change("metal", 0), &state).unwrap();
        assert_eq!(nothing.execute(&mut state).unwrap(), Outcome::Applied(nothing.clone()));
    }

    #[test]
    fn test_regenerate_ship_caps_at_maximum() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "fighter", at(0, 0)).unwrap();
        let regen = Action::new(1, RegenerateShip { ship }, &state).unwrap();
        assert_eq!(regen.execute(&mut state).unwrap(), Outcome::Dropped);

        {
            let hull = state.prop_mut(ship).unwrap().as_ship_mut().unwrap();
            hull.health = 38;
            hull.shields = 0;
        }
        assert!(matches!(regen.execute(&mut state).unwrap(), Outcome::Applied(_)));
        let hull = state.prop(ship).unwrap().as_ship().unwrap();
        assert_eq!((hull.health, hull.shields), (40, 5));
    }

    #[test]
    fn test_regenerate_planet_uses_building_shield_cap() {
        let (mut state, solar) = galaxy();
        let home = state.spawn_planet(solar, Some(1), "terrestrial", at(0, 0)).unwrap();
        {
            let planet = state.prop_mut(home).unwrap().as_planet_mut().unwrap();
            let mut generator = Building::new(BuildingId(1), 0, "shield_generator");
            generator.progress = 3;
            planet.set_building(generator);
            planet.shields = 105;
        }
        let regen = Action::new(1, RegeneratePlanet { planet: home }, &state).unwrap();
        assert!(matches!(regen.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(state.prop(home).unwrap().as_planet().unwrap().shields, 110);
        assert!(!RegeneratePlanet { planet: home }.is_valid(2, &state));
    }
}
