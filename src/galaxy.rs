//! Deterministic galaxy generation.
//!
//! Solar systems sit on a ring, each linked to the next by a portal pair.
//! Every system has a star at its centre and a few neutral planets; every
//! player gets a home planet with a finished shipyard, a scout and a
//! fighter. The same configuration always produces the same state.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentTables;
use crate::error::{EngineError, GeometryError, PlacementError};
use crate::geometry::{Dimension, GridLocation, Point};
use crate::state::{Building, GameState, Player, PlayerId, ResourceAmount, SolarId};

const SYSTEM_NAMES: [&str; 12] = [
    "Sol", "Vega", "Altair", "Deneb", "Rigel", "Sirius", "Procyon", "Capella", "Mira", "Antares",
    "Polaris", "Castor",
];

/// Home planet type.
const HOME_PLANET: &str = "terrestrial";
/// Building placed in slot 0 of every home planet.
const HOME_SHIPYARD: &str = "shipyard";
/// Ships every player starts with, next to the home planet.
const STARTING_SHIPS: [&str; 2] = ["scout", "fighter"];

/// Parameters for [`generate_galaxy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    /// RNG seed.
    pub seed: u64,
    /// Number of players (2-8).
    pub players: usize,
    /// Number of solar systems; at least one per player.
    pub systems: usize,
    /// Width and height of every system.
    pub system_size: i32,
    /// Neutral planets per system.
    pub neutral_planets: usize,
    /// Starting stockpile of every player.
    pub starting_resources: ResourceAmount,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            players: 2,
            systems: 4,
            system_size: 24,
            neutral_planets: 3,
            starting_resources: ResourceAmount::new().with("metal", 200).with("energy", 100),
        }
    }
}

/// Why a galaxy could not be generated.
#[derive(Debug, Error)]
pub enum GalaxyError {
    /// Player count outside 2-8.
    #[error("need 2 to 8 players, got {0}")]
    PlayerCount(usize),
    /// Fewer systems than players.
    #[error("need at least one solar system per player: {systems} systems for {players} players")]
    TooFewSystems {
        /// Requested systems.
        systems: usize,
        /// Requested players.
        players: usize,
    },
    /// Bad system size.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// A system ran out of room.
    #[error("no room for {what} in solar system {solar}")]
    NoRoom {
        /// What was being placed.
        what: String,
        /// Where.
        solar: SolarId,
    },
    /// Placement failed.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// Spawning failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Generate a galaxy.
///
/// # Errors
///
/// Returns an error for invalid parameters or if a system is too small
/// for everything placed in it.
pub fn generate_galaxy(
    config: &GalaxyConfig,
    content: Arc<ContentTables>,
) -> Result<GameState, GalaxyError> {
    if !(2..=8).contains(&config.players) {
        return Err(GalaxyError::PlayerCount(config.players));
    }
    if config.systems < config.players {
        return Err(GalaxyError::TooFewSystems {
            systems: config.systems,
            players: config.players,
        });
    }
    let dimension = Dimension::new(config.system_size, config.system_size)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let players = (1..=config.players)
        .filter_map(|n| PlayerId::try_from(n).ok())
        .map(|id| {
            let resources = config.starting_resources.clone();
            Player::new(id, format!("Player {id}")).with_resources(resources)
        })
        .collect();
    let mut state = GameState::new(players, content);

    let systems: Vec<SolarId> = (0..config.systems)
        .map(|i| {
            let name = SYSTEM_NAMES
                .get(i)
                .map_or_else(|| format!("System {i}"), |name| (*name).to_owned());
            state.add_solar_system(name, dimension)
        })
        .collect();

    for &solar in &systems {
        place_star(&mut state, solar, dimension, &mut rng)?;
    }
    link_ring(&mut state, &systems, &mut rng)?;
    for index in 0..config.players {
        let solar = systems[index * config.systems / config.players];
        let player =
            PlayerId::try_from(index + 1).map_err(|_| GalaxyError::PlayerCount(config.players))?;
        place_home(&mut state, solar, player, &mut rng)?;
    }
    for &solar in &systems {
        for _ in 0..config.neutral_planets {
            let planet_types: Vec<String> = state.content().planets.keys().cloned().collect();
            let Some(planet_type) = planet_types.choose(&mut rng) else {
                break;
            };
            let dimension = planet_dimension(&state, planet_type)?;
            let origin = free_origin(&state, solar, dimension, &mut rng, planet_type)?;
            state.spawn_planet(solar, None, planet_type, origin)?;
        }
    }
    Ok(state)
}

fn planet_dimension(state: &GameState, planet_type: &str) -> Result<Dimension, EngineError> {
    Ok(state.content().planet(planet_type)?.dimension)
}

fn free_origin<R: Rng + ?Sized>(
    state: &GameState,
    solar: SolarId,
    dimension: Dimension,
    rng: &mut R,
    what: &str,
) -> Result<Point, GalaxyError> {
    state
        .solar_system(solar)
        .and_then(|system| system.random_free_location(dimension, rng))
        .map(|location| location.origin)
        .ok_or_else(|| GalaxyError::NoRoom {
            what: what.to_owned(),
            solar,
        })
}

fn place_star<R: Rng + ?Sized>(
    state: &mut GameState,
    solar: SolarId,
    bounds: Dimension,
    rng: &mut R,
) -> Result<(), GalaxyError> {
    let star_types: Vec<String> = state.content().stars.keys().cloned().collect();
    let Some(star_type) = star_types.choose(rng) else {
        return Ok(());
    };
    let size = state.content().star(star_type).map_err(EngineError::from)?.dimension;
    let centre = Point::new(
        (bounds.width() - size.width()) / 2,
        (bounds.height() - size.height()) / 2,
    );
    state.spawn_star(solar, star_type, centre)?;
    Ok(())
}

fn link_ring<R: Rng + ?Sized>(
    state: &mut GameState,
    systems: &[SolarId],
    rng: &mut R,
) -> Result<(), GalaxyError> {
    let links = match systems.len() {
        0 | 1 => 0,
        2 => 1,
        n => n,
    };
    let portal = state.content().portal_dimension;
    for i in 0..links {
        let (from, to) = (systems[i], systems[(i + 1) % systems.len()]);
        let near = free_origin(state, from, portal, rng, "portal")?;
        let far = free_origin(state, to, portal, rng, "portal")?;
        state.link_portals((from, near), (to, far))?;
    }
    Ok(())
}

fn place_home<R: Rng + ?Sized>(
    state: &mut GameState,
    solar: SolarId,
    player: PlayerId,
    rng: &mut R,
) -> Result<(), GalaxyError> {
    let dimension = planet_dimension(state, HOME_PLANET)?;
    let origin = free_origin(state, solar, dimension, rng, HOME_PLANET)?;
    let home = state.spawn_planet(solar, Some(player), HOME_PLANET, origin)?;

    let build_time = state.content().building(HOME_SHIPYARD).map_err(EngineError::from)?.build_time;
    let mut shipyard = Building::new(state.issue_building_id(), 0, HOME_SHIPYARD);
    shipyard.progress = build_time;
    if let Some(planet) = state.prop_mut(home).and_then(|p| p.as_planet_mut()) {
        planet.set_building(shipyard);
    }

    let home_location = GridLocation::new(origin, dimension);
    for ship_type in STARTING_SHIPS {
        let size = state.content().ship(ship_type).map_err(EngineError::from)?.dimension;
        let spot = state
            .solar_system(solar)
            .and_then(|system| system.neighbours(&home_location, size).choose(rng).copied())
            .ok_or_else(|| GalaxyError::NoRoom {
                what: ship_type.to_owned(),
                solar,
            })?;
        state.spawn_ship(solar, player, ship_type, spot.origin)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::check_invariants;

    fn galaxy(seed: u64) -> GameState {
        let config = GalaxyConfig {
            seed,
            ..GalaxyConfig::default()
        };
        generate_galaxy(&config, ContentTables::builtin()).unwrap()
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(galaxy(42), galaxy(42));
        assert_ne!(galaxy(42), galaxy(43));
    }

    #[test]
    fn test_generated_state_is_consistent() {
        for seed in 0..10 {
            let state = galaxy(seed);
            assert!(check_invariants(&state).is_empty(), "seed {seed}");
        }
    }

    #[test]
    fn test_every_player_has_a_home() {
        let state = galaxy(7);
        for player in state.players() {
            let homes: Vec<_> = state.planets_owned_by(player.id).collect();
            assert_eq!(homes.len(), 1);
            let planet = homes[0].as_planet().unwrap();
            let shipyard = state.content().building("shipyard").unwrap();
            assert!(planet.building(0).unwrap().is_complete(shipyard));
            let fleet = state
                .props()
                .filter(|p| p.as_ship().is_some() && p.is_owned_by(player.id))
                .count();
            assert_eq!(fleet, 2);
        }
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn test_ring_of_portals() {
        let state = galaxy(3);
        let portals = state.props().filter(|p| p.as_portal().is_some()).count();
        assert_eq!(portals, 8);
    }

    #[test]
    fn test_rejects_bad_counts() {
        let content = ContentTables::builtin();
        let solo = GalaxyConfig {
            players: 1,
            ..GalaxyConfig::default()
        };
        assert!(matches!(
            generate_galaxy(&solo, content.clone()),
            Err(GalaxyError::PlayerCount(1))
        ));
        let cramped = GalaxyConfig {
            players: 3,
            systems: 2,
            ..GalaxyConfig::default()
        };
        assert!(matches!(
            generate_galaxy(&cramped, content.clone()),
            Err(GalaxyError::TooFewSystems { .. })
        ));
        let tiny = GalaxyConfig {
            system_size: 0,
            ..GalaxyConfig::default()
        };
        assert!(matches!(generate_galaxy(&tiny, content), Err(GalaxyError::Geometry(_))));
    }
}
