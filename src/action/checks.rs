//! Precondition helpers shared by the concrete actions.

use crate::content::{PlanetData, ShipData};
use crate::error::{EngineError, IllegalActionError};
use crate::geometry::{GridLocation, Point};
use crate::pathfinding::{ShipContext, reachable_set};
use crate::state::{
    GameState, Planet, PlayerId, Prop, PropCategory, PropId, ResourceAmount, SolarId,
};

/// Check that `id` exists and has kind `expected`.
pub(crate) fn require_kind(
    state: &GameState,
    id: PropId,
    expected: PropCategory,
) -> Result<&Prop, IllegalActionError> {
    let prop = state.prop(id).ok_or(IllegalActionError::MissingProp(id))?;
    if prop.category() == expected {
        Ok(prop)
    } else {
        Err(IllegalActionError::WrongPropKind {
            prop: id,
            expected,
            found: prop.category(),
        })
    }
}

/// Check that `slot` exists on planet `id`.
pub(crate) fn require_slot(
    state: &GameState,
    id: PropId,
    slot: u32,
) -> Result<(), IllegalActionError> {
    let planet = require_kind(state, id, PropCategory::Planet)?
        .as_planet()
        .ok_or(IllegalActionError::MissingProp(id))?;
    let data = state.content().planet(&planet.planet_type)?;
    if slot < data.slots {
        Ok(())
    } else {
        Err(IllegalActionError::InvalidSlot { planet: id, slot })
    }
}

/// A ship on a grid owned by `actor`.
pub(crate) fn owned_ship(
    state: &GameState,
    actor: PlayerId,
    id: PropId,
) -> Option<ShipContext<'_>> {
    ShipContext::resolve(state, id)
        .ok()
        .filter(|ship| ship.prop.is_owned_by(actor))
}

/// A planet on a grid, with its stats.
pub(crate) struct PlanetContext<'a> {
    pub(crate) prop: &'a Prop,
    pub(crate) planet: &'a Planet,
    #[allow(dead_code)]
    pub(crate) data: &'a PlanetData,
    pub(crate) solar: SolarId,
}

pub(crate) fn planet(state: &GameState, id: PropId) -> Option<PlanetContext<'_>> {
    let prop = state.prop(id)?;
    let planet = prop.as_planet()?;
    let data = state.content().planet(&planet.planet_type).ok()?;
    let solar = state.solar_of(id)?;
    Some(PlanetContext {
        prop,
        planet,
        data,
        solar,
    })
}

pub(crate) fn owned_planet(
    state: &GameState,
    actor: PlayerId,
    id: PropId,
) -> Option<PlanetContext<'_>> {
    planet(state, id).filter(|p| p.prop.is_owned_by(actor))
}

/// Where a ship would stand after moving to `destination`, if that is a
/// legal move for it this turn. Staying put is always legal.
pub(crate) fn reachable_location(
    ship: &ShipContext<'_>,
    destination: Point,
) -> Option<GridLocation> {
    let location = ship.prop.location;
    if destination == location.origin {
        return Some(location);
    }
    reachable_set(ship.solar, location, ship.data.speed, Some(ship.prop.id))
        .contains(&destination)
        .then(|| location.moved_to(destination))
}

/// Whether `location` is free in `solar` and touches `target`.
pub(crate) fn is_free_neighbour(
    state: &GameState,
    solar: SolarId,
    location: &GridLocation,
    target: &GridLocation,
) -> bool {
    location.is_adjacent(target)
        && state
            .solar_system(solar)
            .is_some_and(|s| s.is_free_for(location, None))
}

pub(crate) fn can_afford(state: &GameState, player: PlayerId, cost: &ResourceAmount) -> bool {
    state.get_player(player).is_some_and(|p| p.can_afford(cost))
}

pub(crate) fn pay(
    state: &mut GameState,
    player: PlayerId,
    cost: &ResourceAmount,
) -> Result<(), EngineError> {
    let player = state
        .get_player_mut(player)
        .ok_or_else(|| corrupt(format!("paying player {player} vanished")))?;
    player.resources = player.resources.minus(cost);
    Ok(())
}

pub(crate) fn refund(
    state: &mut GameState,
    player: PlayerId,
    amount: &ResourceAmount,
) -> Result<(), EngineError> {
    let player = state
        .get_player_mut(player)
        .ok_or_else(|| corrupt(format!("refunded player {player} vanished")))?;
    player.resources = player.resources.plus(amount);
    Ok(())
}

pub(crate) fn ship_data<'a>(state: &'a GameState, id: PropId) -> Option<&'a ShipData> {
    let ship = state.prop(id)?.as_ship()?;
    state.content().ship(&ship.ship_type).ok()
}

pub(crate) fn corrupt(message: impl Into<String>) -> EngineError {
    EngineError::StateCorruption(message.into())
}

/// Short label for descriptions: `ship #4`, `planet #9`.
pub(crate) fn label(state: &GameState, id: PropId) -> String {
    state.prop(id).map_or_else(
        || format!("prop {id}"),
        |prop| format!("{} {id}", prop.category()),
    )
}
