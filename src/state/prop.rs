//! Positioned entities.

use serde::{Deserialize, Serialize};

use crate::content::{ContentTables, ShipData};
use crate::geometry::GridLocation;
use crate::state::{Building, PlayerId, ResourceAmount, SolarId};

/// Prop identifier, issued monotonically by the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropId(pub u32);

impl std::fmt::Display for PropId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of a prop, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropCategory {
    /// A ship.
    Ship,
    /// A planet.
    Planet,
    /// A star.
    Star,
    /// A portal.
    Portal,
}

impl std::fmt::Display for PropCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ship => "ship",
            Self::Planet => "planet",
            Self::Star => "star",
            Self::Portal => "portal",
        };
        f.write_str(name)
    }
}

/// A positioned entity inside a solar system (or a ship's cargo hold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    /// Prop ID.
    pub id: PropId,
    /// Owning player; `None` is neutral.
    pub owner: Option<PlayerId>,
    /// Occupied cells. Meaningless while carried as cargo.
    pub location: GridLocation,
    /// Variant payload.
    #[serde(flatten)]
    pub kind: PropKind,
}

/// Variant payload of a prop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropKind {
    /// A mobile ship.
    Ship(Ship),
    /// A stationary planet.
    Planet(Planet),
    /// A stationary, immutable star.
    Star(Star),
    /// A stationary link to another solar system.
    Portal(Portal),
}

/// Ship instance state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    /// Ship type key.
    pub ship_type: String,
    /// Current health.
    pub health: u32,
    /// Current shields.
    pub shields: u32,
    /// Ships carried in the hold.
    #[serde(default)]
    pub cargo: Vec<Prop>,
}

impl Ship {
    /// A freshly built ship at full health and shields.
    #[must_use]
    pub fn new(ship_type: impl Into<String>, data: &ShipData) -> Self {
        Self {
            ship_type: ship_type.into(),
            health: data.health,
            shields: data.shields,
            cargo: Vec::new(),
        }
    }

    /// Apply incoming damage, shields first. Returns `true` if destroyed.
    pub fn absorb(&mut self, damage: u32) -> bool {
        let to_shields = damage.min(self.shields);
        self.shields -= to_shields;
        self.health = self.health.saturating_sub(damage - to_shields);
        self.health == 0
    }
}

/// Planet instance state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    /// Planet type key.
    pub planet_type: String,
    /// Current health.
    pub health: u32,
    /// Current shields.
    pub shields: u32,
    /// Buildings, sorted by slot.
    #[serde(default)]
    pub buildings: Vec<Building>,
}

impl Planet {
    /// A fresh planet at full health and base shields.
    ///
    /// # Errors
    ///
    /// Returns an error if the planet type is unknown.
    pub fn new(
        planet_type: impl Into<String>,
        content: &ContentTables,
    ) -> Result<Self, crate::error::IllegalActionError> {
        let planet_type = planet_type.into();
        let data = content.planet(&planet_type)?;
        Ok(Self {
            health: data.health,
            shields: data.shields,
            planet_type,
            buildings: Vec::new(),
        })
    }

    /// Building in `slot`, if any.
    #[must_use]
    pub fn building(&self, slot: u32) -> Option<&Building> {
        self.buildings.iter().find(|b| b.slot == slot)
    }

    /// Mutable building in `slot`, if any.
    pub fn building_mut(&mut self, slot: u32) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.slot == slot)
    }

    /// Put a building into its slot, replacing any previous occupant.
    pub fn set_building(&mut self, building: Building) {
        self.buildings.retain(|b| b.slot != building.slot);
        let at = self.buildings.partition_point(|b| b.slot < building.slot);
        self.buildings.insert(at, building);
    }

    /// Remove and return the building in `slot`.
    pub fn remove_building(&mut self, slot: u32) -> Option<Building> {
        let at = self.buildings.iter().position(|b| b.slot == slot)?;
        Some(self.buildings.remove(at))
    }

    /// Completed buildings, in slot order.
    pub fn completed_buildings<'a>(
        &'a self,
        content: &'a ContentTables,
    ) -> impl Iterator<Item = &'a Building> + 'a {
        self.buildings.iter().filter(|b| {
            content
                .building(&b.building_type)
                .is_ok_and(|data| b.is_complete(data))
        })
    }

    /// Per-turn income: the planet's base rate plus completed buildings.
    #[must_use]
    pub fn income(&self, content: &ContentTables) -> ResourceAmount {
        let base = content
            .planet(&self.planet_type)
            .map(|data| data.income.clone())
            .unwrap_or_default();
        self.completed_buildings(content)
            .filter_map(|b| content.building(&b.building_type).ok())
            .fold(base, |total, data| total.plus(&data.income))
    }

    /// Shield cap: base shields plus completed building bonuses.
    #[must_use]
    pub fn max_shields(&self, content: &ContentTables) -> u32 {
        let base = content.planet(&self.planet_type).map_or(0, |data| data.shields);
        self.completed_buildings(content)
            .filter_map(|b| content.building(&b.building_type).ok())
            .fold(base, |total, data| total.saturating_add(data.extra_shields))
    }

    /// Apply incoming damage, shields first. Returns `true` if health hit zero.
    pub fn absorb(&mut self, damage: u32) -> bool {
        let to_shields = damage.min(self.shields);
        self.shields -= to_shields;
        self.health = self.health.saturating_sub(damage - to_shields);
        self.health == 0
    }
}

/// Star instance state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    /// Star type key.
    pub star_type: String,
}

/// Portal instance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    /// Solar system on the other side.
    pub destination: SolarId,
    /// Paired portal in the destination system.
    pub paired_portal: PropId,
}

impl Prop {
    /// Create a prop.
    #[must_use]
    pub const fn new(
        id: PropId,
        owner: Option<PlayerId>,
        location: GridLocation,
        kind: PropKind,
    ) -> Self {
        Self {
            id,
            owner,
            location,
            kind,
        }
    }

    /// The prop's kind.
    #[must_use]
    pub const fn category(&self) -> PropCategory {
        match self.kind {
            PropKind::Ship(_) => PropCategory::Ship,
            PropKind::Planet(_) => PropCategory::Planet,
            PropKind::Star(_) => PropCategory::Star,
            PropKind::Portal(_) => PropCategory::Portal,
        }
    }

    /// Whether `player` owns this prop.
    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Ship payload, if this is a ship.
    #[must_use]
    pub const fn as_ship(&self) -> Option<&Ship> {
        match &self.kind {
            PropKind::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    /// Mutable ship payload, if this is a ship.
    pub const fn as_ship_mut(&mut self) -> Option<&mut Ship> {
        match &mut self.kind {
            PropKind::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    /// Planet payload, if this is a planet.
    #[must_use]
    pub const fn as_planet(&self) -> Option<&Planet> {
        match &self.kind {
            PropKind::Planet(planet) => Some(planet),
            _ => None,
        }
    }

    /// Mutable planet payload, if this is a planet.
    pub const fn as_planet_mut(&mut self) -> Option<&mut Planet> {
        match &mut self.kind {
            PropKind::Planet(planet) => Some(planet),
            _ => None,
        }
    }

    /// Portal payload, if this is a portal.
    #[must_use]
    pub const fn as_portal(&self) -> Option<&Portal> {
        match &self.kind {
            PropKind::Portal(portal) => Some(portal),
            _ => None,
        }
    }
}
