//! The authoritative store.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::content::ContentTables;
use crate::error::{EngineError, PlacementError};
use crate::geometry::{Dimension, GridLocation, Point};
use crate::state::{
    BuildingId, Planet, Player, PlayerId, Portal, Prop, PropId, PropKind, Ship, SolarId,
    SolarSystem, Star, check_invariants,
};

/// Where a prop currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropHome {
    /// Directly on a solar system grid.
    Solar(SolarId),
    /// In the cargo hold of a ship.
    Cargo(PropId),
}

/// Complete game state.
///
/// There is exactly one writer at a time. Read-only queries borrow it
/// immutably; only executed actions mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Number of turns resolved so far.
    pub turn: u32,
    players: Vec<Player>,
    solar_systems: BTreeMap<SolarId, SolarSystem>,
    next_prop_id: u32,
    next_building_id: u32,
    #[serde(skip)]
    index: BTreeMap<PropId, PropHome>,
    #[serde(skip, default = "ContentTables::builtin")]
    content: Arc<ContentTables>,
}

impl GameState {
    /// An empty galaxy with the given players.
    #[must_use]
    pub fn new(players: Vec<Player>, content: Arc<ContentTables>) -> Self {
        Self {
            turn: 0,
            players,
            solar_systems: BTreeMap::new(),
            next_prop_id: 1,
            next_building_id: 1,
            index: BTreeMap::new(),
            content,
        }
    }

    /// Decode a state document and bind it to `content`.
    ///
    /// The prop index is rebuilt, ID counters are raised past every ID in
    /// use, and the occupancy invariants are checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or describes an
    /// inconsistent state.
    pub fn from_json(json: &str, content: Arc<ContentTables>) -> Result<Self, EngineError> {
        let mut state: Self = serde_json::from_str(json)?;
        state.content = content;
        state.rebuild_index()?;
        let violations = check_invariants(&state);
        if let Some(first) = violations.first() {
            return Err(EngineError::StateCorruption(first.message.clone()));
        }
        Ok(state)
    }

    /// Encode the state as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn rebuild_index(&mut self) -> Result<(), EngineError> {
        let mut index = BTreeMap::new();
        let mut max_prop = 0;
        let mut max_building = 0;
        for (solar_id, solar) in &self.solar_systems {
            if solar.id() != *solar_id {
                return Err(EngineError::StateCorruption(format!(
                    "solar system {} stored under key {solar_id}",
                    solar.id()
                )));
            }
            for prop in solar.props() {
                let mut entries = vec![(prop.id, PropHome::Solar(*solar_id))];
                if let Some(ship) = prop.as_ship() {
                    entries.extend(ship.cargo.iter().map(|c| (c.id, PropHome::Cargo(prop.id))));
                }
                if let Some(planet) = prop.as_planet() {
                    for building in &planet.buildings {
                        max_building = max_building.max(building.id.0);
                    }
                }
                for (id, home) in entries {
                    max_prop = max_prop.max(id.0);
                    if index.insert(id, home).is_some() {
                        return Err(EngineError::StateCorruption(format!(
                            "prop {id} appears more than once"
                        )));
                    }
                }
            }
        }
        self.index = index;
        self.next_prop_id = self.next_prop_id.max(max_prop + 1);
        self.next_building_id = self.next_building_id.max(max_building + 1);
        Ok(())
    }

    /// The content tables this state is bound to.
    #[must_use]
    pub fn content(&self) -> &ContentTables {
        &self.content
    }

    /// Shared handle to the content tables.
    #[must_use]
    pub fn content_handle(&self) -> Arc<ContentTables> {
        Arc::clone(&self.content)
    }

    /// All players, in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Get a player by ID.
    #[must_use]
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Add an empty solar system and return its ID.
    pub fn add_solar_system(&mut self, name: impl Into<String>, dimension: Dimension) -> SolarId {
        let id = SolarId(
            self.solar_systems
                .keys()
                .next_back()
                .map_or(1, |last| last.0 + 1),
        );
        self.solar_systems
            .insert(id, SolarSystem::new(id, name, dimension));
        id
    }

    /// Get a solar system by ID.
    #[must_use]
    pub fn solar_system(&self, id: SolarId) -> Option<&SolarSystem> {
        self.solar_systems.get(&id)
    }

    /// All solar systems, in ID order.
    pub fn solar_systems(&self) -> impl Iterator<Item = &SolarSystem> {
        self.solar_systems.values()
    }

    /// The ID the next created prop will receive.
    #[must_use]
    pub const fn peek_prop_id(&self) -> PropId {
        PropId(self.next_prop_id)
    }

    pub(crate) const fn issue_prop_id(&mut self) -> PropId {
        let id = PropId(self.next_prop_id);
        self.next_prop_id += 1;
        id
    }

    pub(crate) const fn issue_building_id(&mut self) -> BuildingId {
        let id = BuildingId(self.next_building_id);
        self.next_building_id += 1;
        id
    }

    /// Create a prop with a fresh ID in a solar system.
    ///
    /// # Errors
    ///
    /// Returns a [`PlacementError`] if the location does not fit or is
    /// occupied; the prop is not added.
    pub fn place_prop(
        &mut self,
        solar: SolarId,
        owner: Option<PlayerId>,
        location: GridLocation,
        kind: PropKind,
    ) -> Result<PropId, PlacementError> {
        let system = self
            .solar_systems
            .get(&solar)
            .ok_or(PlacementError::UnknownSolarSystem(solar))?;
        system.check_placement(self.peek_prop_id(), &location)?;
        let id = self.issue_prop_id();
        self.insert_prop(solar, Prop::new(id, owner, location, kind))?;
        Ok(id)
    }

    fn insert_prop(&mut self, solar: SolarId, prop: Prop) -> Result<(), PlacementError> {
        if self.index.contains_key(&prop.id) {
            return Err(PlacementError::DuplicateId(prop.id));
        }
        let system = self
            .solar_systems
            .get_mut(&solar)
            .ok_or(PlacementError::UnknownSolarSystem(solar))?;
        let id = prop.id;
        let cargo: Vec<PropId> = prop
            .as_ship()
            .map(|ship| ship.cargo.iter().map(|c| c.id).collect())
            .unwrap_or_default();
        system.add_prop(prop)?;
        self.index.insert(id, PropHome::Solar(solar));
        for carried in cargo {
            self.index.insert(carried, PropHome::Cargo(id));
        }
        Ok(())
    }

    /// Create a ship at full strength.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown ship type or a failed placement.
    pub fn spawn_ship(
        &mut self,
        solar: SolarId,
        owner: PlayerId,
        ship_type: &str,
        origin: Point,
    ) -> Result<PropId, EngineError> {
        let data = self.content.ship(ship_type)?;
        let location = GridLocation::new(origin, data.dimension);
        let kind = PropKind::Ship(Ship::new(ship_type, data));
        Ok(self.place_prop(solar, Some(owner), location, kind)?)
    }

    /// Create a planet at full strength.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown planet type or a failed placement.
    pub fn spawn_planet(
        &mut self,
        solar: SolarId,
        owner: Option<PlayerId>,
        planet_type: &str,
        origin: Point,
    ) -> Result<PropId, EngineError> {
        let planet = Planet::new(planet_type, &self.content)?;
        let dimension = self.content.planet(planet_type)?.dimension;
        let location = GridLocation::new(origin, dimension);
        Ok(self.place_prop(solar, owner, location, PropKind::Planet(planet))?)
    }

    /// Create a star.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown star type or a failed placement.
    pub fn spawn_star(
        &mut self,
        solar: SolarId,
        star_type: &str,
        origin: Point,
    ) -> Result<PropId, EngineError> {
        let dimension = self.content.star(star_type)?.dimension;
        let location = GridLocation::new(origin, dimension);
        let kind = PropKind::Star(Star {
            star_type: star_type.to_owned(),
        });
        Ok(self.place_prop(solar, None, location, kind)?)
    }

    /// Create a linked pair of neutral portals.
    ///
    /// # Errors
    ///
    /// Returns an error if either portal cannot be placed; nothing is
    /// added in that case.
    pub fn link_portals(
        &mut self,
        (solar_a, origin_a): (SolarId, Point),
        (solar_b, origin_b): (SolarId, Point),
    ) -> Result<(PropId, PropId), PlacementError> {
        let dimension = self.content.portal_dimension;
        let location_a = GridLocation::new(origin_a, dimension);
        let location_b = GridLocation::new(origin_b, dimension);
        let id_a = PropId(self.next_prop_id);
        let id_b = PropId(self.next_prop_id + 1);
        for (solar, id, location) in [(solar_a, id_a, location_a), (solar_b, id_b, location_b)] {
            self.solar_systems
                .get(&solar)
                .ok_or(PlacementError::UnknownSolarSystem(solar))?
                .check_placement(id, &location)?;
        }
        if solar_a == solar_b && location_a.collides(&location_b) {
            return Err(PlacementError::Occupied {
                prop: id_b,
                location: location_b,
                occupant: id_a,
            });
        }
        self.next_prop_id += 2;
        let portal = |destination, paired_portal| {
            PropKind::Portal(Portal {
                destination,
                paired_portal,
            })
        };
        self.insert_prop(solar_a, Prop::new(id_a, None, location_a, portal(solar_b, id_b)))?;
        self.insert_prop(solar_b, Prop::new(id_b, None, location_b, portal(solar_a, id_a)))?;
        Ok((id_a, id_b))
    }

    /// Where a prop lives.
    #[must_use]
    pub fn home(&self, id: PropId) -> Option<PropHome> {
        self.index.get(&id).copied()
    }

    /// The solar system a prop sits in directly, if it is on a grid.
    #[must_use]
    pub fn solar_of(&self, id: PropId) -> Option<SolarId> {
        match self.home(id)? {
            PropHome::Solar(solar) => Some(solar),
            PropHome::Cargo(_) => None,
        }
    }

    /// Look up any prop, including carried ships.
    #[must_use]
    pub fn prop(&self, id: PropId) -> Option<&Prop> {
        match self.home(id)? {
            PropHome::Solar(solar) => self.solar_systems.get(&solar)?.prop(id),
            PropHome::Cargo(carrier) => self
                .prop(carrier)?
                .as_ship()?
                .cargo
                .iter()
                .find(|c| c.id == id),
        }
    }

    pub(crate) fn prop_mut(&mut self, id: PropId) -> Option<&mut Prop> {
        match self.home(id)? {
            PropHome::Solar(solar) => self.solar_systems.get_mut(&solar)?.prop_mut(id),
            PropHome::Cargo(carrier) => {
                let carrier_solar = self.solar_of(carrier)?;
                self.solar_systems
                    .get_mut(&carrier_solar)?
                    .prop_mut(carrier)?
                    .as_ship_mut()?
                    .cargo
                    .iter_mut()
                    .find(|c| c.id == id)
            }
        }
    }

    /// Every prop on a grid, in solar then ID order. Carried ships are
    /// not included.
    pub fn props(&self) -> impl Iterator<Item = &Prop> {
        self.solar_systems.values().flat_map(SolarSystem::props)
    }

    /// Planets owned by `player`.
    pub fn planets_owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Prop> {
        self.props()
            .filter(move |prop| prop.as_planet().is_some() && prop.is_owned_by(player))
    }

    /// Remove a prop and everything it carries.
    pub(crate) fn remove_prop(&mut self, id: PropId) -> Option<Prop> {
        let removed = match self.home(id)? {
            PropHome::Solar(solar) => self.solar_systems.get_mut(&solar)?.remove_prop(id)?,
            PropHome::Cargo(carrier) => {
                let hold = &mut self.prop_mut(carrier)?.as_ship_mut()?.cargo;
                let at = hold.iter().position(|c| c.id == id)?;
                hold.remove(at)
            }
        };
        self.index.remove(&id);
        if let Some(ship) = removed.as_ship() {
            for carried in &ship.cargo {
                self.index.remove(&carried.id);
            }
        }
        Some(removed)
    }

    /// Move a prop to a new origin within its solar system.
    pub(crate) fn relocate_prop(
        &mut self,
        id: PropId,
        origin: Point,
    ) -> Result<(), PlacementError> {
        let solar = self.solar_of(id).ok_or(PlacementError::UnknownProp(id))?;
        self.solar_systems
            .get_mut(&solar)
            .ok_or(PlacementError::UnknownSolarSystem(solar))?
            .relocate(id, origin)
    }

    /// Move a prop from wherever it is onto a grid at `location`.
    pub(crate) fn transfer_prop(
        &mut self,
        id: PropId,
        solar: SolarId,
        location: GridLocation,
    ) -> Result<(), PlacementError> {
        self.solar_systems
            .get(&solar)
            .ok_or(PlacementError::UnknownSolarSystem(solar))?
            .check_placement(id, &location)?;
        let mut prop = self.remove_prop(id).ok_or(PlacementError::UnknownProp(id))?;
        prop.location = location;
        self.insert_prop(solar, prop)
    }

    /// Move a ship from its grid into a carrier's hold.
    pub(crate) fn load_cargo(&mut self, ship: PropId, carrier: PropId) -> Result<(), EngineError> {
        if self.solar_of(carrier).is_none() {
            return Err(EngineError::StateCorruption(format!(
                "carrier {carrier} is not on a grid"
            )));
        }
        let prop = self
            .remove_prop(ship)
            .ok_or(PlacementError::UnknownProp(ship))?;
        let hold = self
            .prop_mut(carrier)
            .and_then(Prop::as_ship_mut)
            .ok_or_else(|| EngineError::StateCorruption(format!("carrier {carrier} vanished")))?;
        hold.cargo.push(prop);
        self.index.insert(ship, PropHome::Cargo(carrier));
        Ok(())
    }

    /// Whether `player` owns no planets.
    #[must_use]
    pub fn has_lost(&self, player: PlayerId) -> bool {
        self.planets_owned_by(player).next().is_none()
    }

    /// The only player still owning planets, if exactly one remains.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        let mut remaining = self.players.iter().filter(|p| !self.has_lost(p.id));
        let first = remaining.next()?;
        remaining.next().is_none().then_some(first.id)
    }

    pub(crate) const fn advance_turn(&mut self) {
        self.turn += 1;
    }

    #[cfg(test)]
    pub(crate) fn players_mut_for_tests(&mut self) -> &mut Vec<Player> {
        &mut self.players
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> (GameState, SolarId) {
        let players = vec![Player::new(1, "Ada"), Player::new(2, "Brin")];
        let mut state = GameState::new(players, ContentTables::builtin());
        let solar = state.add_solar_system("Sol", Dimension::new(12, 12).unwrap());
        (state, solar)
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (mut state, solar) = state();
        let a = state.spawn_ship(solar, 1, "scout", Point::new(0, 0)).unwrap();
        let b = state.spawn_star(solar, "yellow_dwarf", Point::new(5, 5)).unwrap();
        assert!(b > a);
        assert_eq!(state.peek_prop_id(), PropId(b.0 + 1));
    }

    #[test]
    fn test_failed_placement_adds_nothing() {
        let (mut state, solar) = state();
        state.spawn_star(solar, "yellow_dwarf", Point::new(0, 0)).unwrap();
        let err = state.spawn_ship(solar, 1, "scout", Point::new(1, 1)).unwrap_err();
        assert!(matches!(err, EngineError::Placement(PlacementError::Occupied { .. })));
        assert_eq!(state.props().count(), 1);
    }

    #[test]
    fn test_cargo_round_trip_through_index() {
        let (mut state, solar) = state();
        let carrier = state.spawn_ship(solar, 1, "cruiser", Point::new(0, 0)).unwrap();
        let scout = state.spawn_ship(solar, 1, "scout", Point::new(2, 0)).unwrap();
        state.load_cargo(scout, carrier).unwrap();
        assert_eq!(state.home(scout), Some(PropHome::Cargo(carrier)));
        assert!(state.prop(scout).is_some());
        assert!(!state.solar_system(solar).unwrap().is_occupied(&GridLocation::unit(2, 0)));

        state
            .transfer_prop(scout, solar, GridLocation::unit(5, 5))
            .unwrap();
        assert_eq!(state.home(scout), Some(PropHome::Solar(solar)));
        assert!(state.prop(carrier).unwrap().as_ship().unwrap().cargo.is_empty());
    }

    #[test]
    fn test_removing_carrier_removes_cargo() {
        let (mut state, solar) = state();
        let carrier = state.spawn_ship(solar, 1, "cruiser", Point::new(0, 0)).unwrap();
        let scout = state.spawn_ship(solar, 1, "scout", Point::new(2, 0)).unwrap();
        state.load_cargo(scout, carrier).unwrap();
        state.remove_prop(carrier).unwrap();
        assert!(state.prop(scout).is_none());
        assert!(state.home(scout).is_none());
    }

    #[test]
    fn test_json_round_trip_rebuilds_index() {
        let (mut state, solar) = state();
        let carrier = state.spawn_ship(solar, 1, "cruiser", Point::new(0, 0)).unwrap();
        let scout = state.spawn_ship(solar, 1, "scout", Point::new(2, 0)).unwrap();
        state.load_cargo(scout, carrier).unwrap();
        let other = state.add_solar_system("Vega", Dimension::new(8, 8).unwrap());
        state
            .link_portals((solar, Point::new(11, 6)), (other, Point::new(0, 3)))
            .unwrap();

        let json = state.to_json().unwrap();
        let back = GameState::from_json(&json, ContentTables::builtin()).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.home(scout), Some(PropHome::Cargo(carrier)));
    }

    #[test]
    fn test_from_json_rejects_overlap() {
        let (mut state, solar) = state();
        state.spawn_ship(solar, 1, "scout", Point::new(0, 0)).unwrap();
        let mut doc: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        let props = &mut doc["solar_systems"]["1"]["props"];
        let mut copy = props["1"].clone();
        copy["id"] = serde_json::json!(9);
        props["9"] = copy;
        let err = GameState::from_json(&doc.to_string(), ContentTables::builtin()).unwrap_err();
        assert!(matches!(err, EngineError::StateCorruption(_)));
    }

    #[test]
    fn test_winner_and_has_lost() {
        let (mut state, solar) = state();
        state.spawn_planet(solar, Some(1), "barren", Point::new(0, 0)).unwrap();
        assert!(!state.has_lost(1));
        assert!(state.has_lost(2));
        assert_eq!(state.winner(), Some(1));
        state.spawn_planet(solar, Some(2), "barren", Point::new(4, 4)).unwrap();
        assert_eq!(state.winner(), None);
    }
}
