//! Ship construction at shipyards.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::checks::{
    PlanetContext, can_afford, corrupt, is_free_neighbour, label, owned_planet, pay, planet,
    refund, require_slot,
};
use crate::action::{ActionEffect, Applied};
use crate::content::ShipData;
use crate::error::{EngineError, IllegalActionError};
use crate::geometry::{GridLocation, Point};
use crate::state::{GameState, PlayerId, Prop, PropId, ResourceAmount, ShipConstruction, SolarId};

/// Whether the completed building in `slot` can build `ship_type`.
fn can_build(state: &GameState, host: &PlanetContext<'_>, slot: u32, ship_type: &str) -> bool {
    host.planet.building(slot).is_some_and(|building| {
        state
            .content()
            .building(&building.building_type)
            .is_ok_and(|data| {
                building.is_complete(data) && data.ship_types.iter().any(|t| t == ship_type)
            })
    })
}

fn construction<'a>(host: &PlanetContext<'a>, slot: u32) -> Option<&'a ShipConstruction> {
    host.planet.building(slot)?.ship_construction.as_ref()
}

/// What turn `step` of building a ship costs.
fn installment(data: &ShipData, step: u32) -> ResourceAmount {
    data.cost.installment(data.build_time, step)
}

/// Build a ship in one go, paying the full cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructShip {
    /// Host planet.
    pub planet: PropId,
    /// Shipyard slot.
    pub slot: u32,
    /// Ship type key.
    pub ship_type: String,
    /// Origin of the new ship; must touch the planet.
    pub location: Point,
}

impl ActionEffect for ConstructShip {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_slot(state, self.planet, self.slot)?;
        state.content().ship(&self.ship_type).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let (Some(host), Ok(data)) = (
            owned_planet(state, actor, self.planet),
            state.content().ship(&self.ship_type),
        ) else {
            return false;
        };
        let location = GridLocation::new(self.location, data.dimension);
        can_build(state, &host, self.slot, &self.ship_type)
            && can_afford(state, actor, &data.cost)
            && is_free_neighbour(state, host.solar, &location, &host.prop.location)
    }

    fn apply(&self, actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let cost = state.content().ship(&self.ship_type)?.cost.clone();
        let solar = state
            .solar_of(self.planet)
            .ok_or_else(|| corrupt(format!("planet {} left its grid", self.planet)))?;
        pay(state, actor, &cost)?;
        let ship = state.spawn_ship(solar, actor, &self.ship_type, self.location)?;
        info!(%ship, ship_type = %self.ship_type, player = actor, "ship constructed");
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} constructs a {} at {}",
            self.ship_type,
            label(state, self.planet)
        )
    }
}

/// Invest one turn into a ship under construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncrementShipConstruction {
    /// Host planet.
    pub planet: PropId,
    /// Shipyard slot.
    pub slot: u32,
    /// Ship type key.
    pub ship_type: String,
    /// Where the ship appears when it completes. Chosen by the server when
    /// absent.
    #[serde(default)]
    pub spawn: Option<Point>,
}

impl IncrementShipConstruction {
    /// Progress after this increment.
    fn next_progress(&self, state: &GameState) -> Option<u32> {
        let host = planet(state, self.planet)?;
        Some(construction(&host, self.slot).map_or(0, |c| c.progress) + 1)
    }

    fn spawn_location(
        &self,
        state: &GameState,
        data: &ShipData,
    ) -> Option<(SolarId, GridLocation)> {
        let host = planet(state, self.planet)?;
        let location = GridLocation::new(self.spawn?, data.dimension);
        is_free_neighbour(state, host.solar, &location, &host.prop.location)
            .then_some((host.solar, location))
    }

    pub(crate) fn rolled<R: Rng + ?Sized>(&self, state: &GameState, rng: &mut R) -> Self {
        if self.spawn.is_some() {
            return self.clone();
        }
        let (Ok(data), Some(progress)) = (
            state.content().ship(&self.ship_type),
            self.next_progress(state),
        ) else {
            return self.clone();
        };
        if progress < data.build_time {
            return self.clone();
        }
        let spawn = planet(state, self.planet)
            .and_then(|host| {
                let solar = state.solar_system(host.solar)?;
                solar
                    .neighbours(&host.prop.location, data.dimension)
                    .choose(rng)
                    .map(|location| location.origin)
            });
        Self {
            spawn,
            ..self.clone()
        }
    }
}

impl ActionEffect for IncrementShipConstruction {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_slot(state, self.planet, self.slot)?;
        state.content().ship(&self.ship_type).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let (Some(host), Ok(data)) = (
            owned_planet(state, actor, self.planet),
            state.content().ship(&self.ship_type),
        ) else {
            return false;
        };
        let underway = construction(&host, self.slot);
        let same_type = underway.is_none_or(|c| c.ship_type == self.ship_type);
        let step = underway.map_or(0, |c| c.progress) + 1;
        can_build(state, &host, self.slot, &self.ship_type)
            && same_type
            && can_afford(state, actor, &installment(data, step))
    }

    fn apply(&self, actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let data = state.content().ship(&self.ship_type)?.clone();
        let progress = self
            .next_progress(state)
            .ok_or_else(|| corrupt(format!("planet {} vanished", self.planet)))?;
        let payment = installment(&data, progress);

        if progress >= data.build_time {
            // The final installment only goes through once the ship has room.
            let Some((solar, location)) = self.spawn_location(state, &data) else {
                debug!(planet = %self.planet, slot = self.slot, "no room to launch ship, holding");
                return Ok(Applied::NoEffect);
            };
            pay(state, actor, &payment)?;
            if let Some(building) = state
                .prop_mut(self.planet)
                .and_then(Prop::as_planet_mut)
                .and_then(|p| p.building_mut(self.slot))
            {
                building.ship_construction = None;
            }
            let ship = state.spawn_ship(solar, actor, &self.ship_type, location.origin)?;
            info!(%ship, ship_type = %self.ship_type, player = actor, "ship launched");
            return Ok(Applied::AsIssued);
        }

        pay(state, actor, &payment)?;
        let building = state
            .prop_mut(self.planet)
            .and_then(Prop::as_planet_mut)
            .and_then(|p| p.building_mut(self.slot))
            .ok_or_else(|| corrupt(format!("shipyard in slot {} vanished", self.slot)))?;
        building.ship_construction = Some(ShipConstruction {
            ship_type: self.ship_type.clone(),
            progress,
        });
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} continues a {} at {}",
            self.ship_type,
            label(state, self.planet)
        )
    }
}

/// Abandon a ship under construction and recover what was invested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CancelShipConstruction {
    /// Host planet.
    pub planet: PropId,
    /// Shipyard slot.
    pub slot: u32,
}

impl ActionEffect for CancelShipConstruction {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_slot(state, self.planet, self.slot)
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        owned_planet(state, actor, self.planet)
            .is_some_and(|host| construction(&host, self.slot).is_some())
    }

    fn apply(&self, actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let cancelled = state
            .prop_mut(self.planet)
            .and_then(Prop::as_planet_mut)
            .and_then(|p| p.building_mut(self.slot))
            .and_then(|b| b.ship_construction.take())
            .ok_or_else(|| corrupt(format!("construction in slot {} vanished", self.slot)))?;
        let data = state.content().ship(&cancelled.ship_type)?;
        let invested = (1..=cancelled.progress)
            .map(|step| installment(data, step))
            .fold(ResourceAmount::new(), |sum, paid| sum.plus(&paid));
        refund(state, actor, &invested)?;
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} cancels construction in slot {} of {}",
            self.slot,
            label(state, self.planet)
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::action::fixtures::{at, galaxy};
    use crate::action::{Action, Outcome};
    use crate::state::{Building, BuildingId};

    /// A terrestrial planet at (5, 5) owned by player 1 with a finished
    /// shipyard in slot 0.
    fn shipyard() -> (GameState, SolarId, PropId) {
        let (mut state, solar) = galaxy();
        let home = state.spawn_planet(solar, Some(1), "terrestrial", at(5, 5)).unwrap();
        let mut yard = Building::new(BuildingId(0), 0, "shipyard");
        yard.progress = 3;
        state.prop_mut(home).unwrap().as_planet_mut().unwrap().set_building(yard);
        (state, solar, home)
    }

    fn metal(state: &GameState) -> i64 {
        state.get_player(1).unwrap().resources.get("metal")
    }

    fn construct(home: PropId, slot: u32, location: Point) -> ConstructShip {
        ConstructShip {
            planet: home,
            slot,
            ship_type: "fighter".into(),
            location,
        }
    }

    fn increment(home: PropId, ship_type: &str, spawn: Option<Point>) -> IncrementShipConstruction {
        IncrementShipConstruction {
            planet: home,
            slot: 0,
            ship_type: ship_type.into(),
            spawn,
        }
    }

    #[test]
    fn test_construct_ship_spawns_immediately() {
        let (mut state, solar, home) = shipyard();
        let action = Action::new(1, construct(home, 0, at(7, 5)), &state).unwrap();
        assert!(matches!(action.execute(&mut state).unwrap(), Outcome::Applied(_)));
        let spawned = state.solar_system(solar).unwrap().prop_at(at(7, 5)).unwrap();
        assert_eq!(spawned.owner, Some(1));
        assert_eq!(metal(&state), 460);
    }

    #[test]
    fn test_construct_ship_requires_contact_and_shipyard() {
        let (mut state, _, home) = shipyard();
        assert!(!construct(home, 0, at(9, 9)).is_valid(1, &state));
        assert!(!construct(home, 1, at(7, 5)).is_valid(1, &state));
        let planet = state.prop_mut(home).unwrap().as_planet_mut().unwrap();
        planet.building_mut(0).unwrap().progress = 1;
        assert!(!construct(home, 0, at(7, 5)).is_valid(1, &state));
    }

    #[test]
    fn test_incremental_construction_launches_on_last_turn() {
        let (mut state, solar, home) = shipyard();
        let action = Action::new(1, increment(home, "fighter", Some(at(4, 5))), &state).unwrap();
        action.execute(&mut state).unwrap();
        let planet = state.prop(home).unwrap().as_planet().unwrap();
        assert_eq!(planet.building(0).unwrap().ship_construction.as_ref().unwrap().progress, 1);
        assert_eq!(metal(&state), 480);

        action.execute(&mut state).unwrap();
        let planet = state.prop(home).unwrap().as_planet().unwrap();
        assert!(planet.building(0).unwrap().ship_construction.is_none());
        assert!(state.solar_system(solar).unwrap().prop_at(at(4, 5)).is_some());
        assert_eq!(metal(&state), 460);
    }

    #[test]
    fn test_blocked_launch_holds_progress() {
        let (mut state, solar, home) = shipyard();
        state.spawn_ship(solar, 2, "scout", at(4, 5)).unwrap();
        let action = Action::new(1, increment(home, "scout", Some(at(4, 5))), &state).unwrap();
        assert_eq!(action.execute(&mut state).unwrap(), Outcome::Dropped);
        assert_eq!(metal(&state), 500);
    }

    #[test]
    fn test_spawn_rolled_only_on_completion() {
        let (state, _, home) = shipyard();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let rolled = increment(home, "scout", None).rolled(&state, &mut rng);
        let spawn = GridLocation::unit(rolled.spawn.unwrap().x, rolled.spawn.unwrap().y);
        assert!(spawn.is_adjacent(&state.prop(home).unwrap().location));

        let cruiser = increment(home, "cruiser", None);
        assert_eq!(cruiser.rolled(&state, &mut rng).spawn, None);
    }

    #[test]
    fn test_cancel_refunds_investment() {
        let (mut state, _, home) = shipyard();
        let action = Action::new(1, increment(home, "cruiser", None), &state).unwrap();
        action.execute(&mut state).unwrap();
        action.execute(&mut state).unwrap();
        assert_eq!(metal(&state), 440);

        let cancel = CancelShipConstruction {
            planet: home,
            slot: 0,
        };
        let cancel = Action::new(1, cancel, &state).unwrap();
        assert!(matches!(cancel.execute(&mut state).unwrap(), Outcome::Applied(_)));
        assert_eq!(metal(&state), 500);
        assert_eq!(cancel.execute(&mut state).unwrap(), Outcome::Dropped);
    }
}
