//! Weapons fire against ships and planets.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::action::checks::{corrupt, label, owned_ship, planet, require_kind, ship_data};
use crate::action::{ActionEffect, Applied};
use crate::error::{EngineError, IllegalActionError};
use crate::pathfinding::ShipContext;
use crate::state::{GameState, PlayerId, Prop, PropCategory, PropId};

/// Roll damage uniformly in `[floor_percent% of max, max]`, never below 1.
fn roll_damage<R: Rng + ?Sized>(rng: &mut R, max: u32, floor_percent: u32) -> u32 {
    let floor = u64::from(max) * u64::from(floor_percent.min(100)) / 100;
    let floor = u32::try_from(floor).unwrap_or(max).clamp(1, max);
    rng.gen_range(floor..=max)
}

/// Rolled damage for `ship`, or `damage` unchanged if it cannot fire.
fn rolled_damage<R: Rng + ?Sized>(
    state: &GameState,
    ship: PropId,
    damage: u32,
    rng: &mut R,
    floor_percent: u32,
) -> u32 {
    match ship_data(state, ship) {
        Some(data) if data.is_armed() => roll_damage(rng, data.damage, floor_percent),
        _ => damage,
    }
}

/// An armed ship that may fire `damage` this turn.
fn armed_shooter(
    state: &GameState,
    actor: PlayerId,
    ship: PropId,
    damage: u32,
) -> Option<ShipContext<'_>> {
    owned_ship(state, actor, ship).filter(|s| s.data.is_armed() && damage <= s.data.damage)
}

fn is_hostile(target: &Prop, actor: PlayerId) -> bool {
    target.owner.is_some_and(|owner| owner != actor)
}

/// Fire at another player's ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShootShip {
    /// Firing ship.
    pub ship: PropId,
    /// Target ship.
    pub target: PropId,
    /// Damage dealt; rolled by the server.
    #[serde(default)]
    pub damage: u32,
}

impl ShootShip {
    pub(crate) fn rolled<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        rng: &mut R,
        floor_percent: u32,
    ) -> Self {
        Self {
            damage: rolled_damage(state, self.ship, self.damage, rng, floor_percent),
            ..*self
        }
    }
}

impl ActionEffect for ShootShip {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.ship, PropCategory::Ship)?;
        require_kind(state, self.target, PropCategory::Ship).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let Some(shooter) = armed_shooter(state, actor, self.ship, self.damage) else {
            return false;
        };
        let Ok(target) = ShipContext::resolve(state, self.target) else {
            return false;
        };
        is_hostile(target.prop, actor)
            && target.solar.id() == shooter.solar.id()
            && shooter
                .prop
                .location
                .within_range(&target.prop.location, shooter.data.range)
    }

    fn apply(&self, _actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let destroyed = state
            .prop_mut(self.target)
            .and_then(Prop::as_ship_mut)
            .ok_or_else(|| corrupt(format!("target {} vanished", self.target)))?
            .absorb(self.damage);
        if destroyed {
            info!(ship = %self.target, by = %self.ship, "ship destroyed");
            state.remove_prop(self.target);
        }
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} fires {} at {} for {}",
            label(state, self.ship),
            label(state, self.target),
            self.damage
        )
    }
}

/// Bombard another player's planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BombPlanet {
    /// Firing ship.
    pub ship: PropId,
    /// Target planet.
    pub planet: PropId,
    /// Damage dealt; rolled by the server.
    #[serde(default)]
    pub damage: u32,
}

impl BombPlanet {
    pub(crate) fn rolled<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        rng: &mut R,
        floor_percent: u32,
    ) -> Self {
        Self {
            damage: rolled_damage(state, self.ship, self.damage, rng, floor_percent),
            ..*self
        }
    }
}

impl ActionEffect for BombPlanet {
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError> {
        require_kind(state, self.ship, PropCategory::Ship)?;
        require_kind(state, self.planet, PropCategory::Planet).map(|_| ())
    }

    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool {
        let Some(shooter) = armed_shooter(state, actor, self.ship, self.damage) else {
            return false;
        };
        let Some(target) = planet(state, self.planet) else {
            return false;
        };
        is_hostile(target.prop, actor)
            && target.solar == shooter.solar.id()
            && shooter
                .prop
                .location
                .within_range(&target.prop.location, shooter.data.range)
    }

    fn apply(&self, _actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError> {
        let prop = state
            .prop_mut(self.planet)
            .ok_or_else(|| corrupt(format!("planet {} vanished", self.planet)))?;
        let former = prop.owner;
        let target = prop
            .as_planet_mut()
            .ok_or_else(|| corrupt(format!("prop {} is no longer a planet", self.planet)))?;
        if target.absorb(self.damage) {
            target.buildings.clear();
            target.shields = 0;
            prop.owner = None;
            info!(planet = %self.planet, former = ?former, "planet neutralised");
        }
        Ok(Applied::AsIssued)
    }

    fn describe(&self, actor: PlayerId, state: &GameState) -> String {
        format!(
            "player {actor} bombs {} with {} for {}",
            label(state, self.planet),
            label(state, self.ship),
            self.damage
        )
    }
}
