//! Static per-type reference data.
//!
//! Ship, planet, building and star statistics are loaded once and queried
//! by type key. Nothing in here changes during a game.

use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Arc, LazyLock},
};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, read_file};
use crate::error::IllegalActionError;
use crate::geometry::Dimension;
use crate::state::ResourceAmount;

/// Content tables shipped with the crate.
pub const BUILTIN_CONTENT: &str = include_str!("data/content.json");

static BUILTIN_TABLES: LazyLock<Arc<ContentTables>> = LazyLock::new(|| {
    Arc::new(serde_json::from_str(BUILTIN_CONTENT).expect("builtin content tables should parse"))
});

/// Statistics for one ship type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipData {
    /// Display name.
    pub title: String,
    /// Footprint on the grid.
    pub dimension: Dimension,
    /// Cells per turn.
    pub speed: u32,
    /// Maximum health.
    pub health: u32,
    /// Maximum shields.
    pub shields: u32,
    /// Maximum damage per shot; zero means unarmed.
    pub damage: u32,
    /// Weapon range in cells, centre to centre.
    pub range: u32,
    /// Number of ships it can carry.
    #[serde(default)]
    pub cargo_capacity: u32,
    /// Whether it may use portals.
    #[serde(default)]
    pub can_jump: bool,
    /// Whether it may capture neutral planets.
    #[serde(default)]
    pub can_capture: bool,
    /// Total construction cost.
    pub cost: ResourceAmount,
    /// Turns of construction.
    pub build_time: u32,
    /// Health restored per regeneration.
    #[serde(default)]
    pub health_regen: u32,
    /// Shields restored per regeneration.
    #[serde(default)]
    pub shield_regen: u32,
}

impl ShipData {
    /// Whether the ship can shoot at all.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.damage > 0
    }
}

/// Statistics for one planet type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetData {
    /// Footprint on the grid.
    pub dimension: Dimension,
    /// Number of building slots.
    pub slots: u32,
    /// Resources produced per turn while owned.
    pub income: ResourceAmount,
    /// Maximum health.
    pub health: u32,
    /// Base maximum shields, before building bonuses.
    pub shields: u32,
    /// Health restored per regeneration.
    #[serde(default)]
    pub health_regen: u32,
    /// Shields restored per regeneration.
    #[serde(default)]
    pub shield_regen: u32,
}

/// Statistics for one building type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Display name.
    pub title: String,
    /// Total construction cost.
    pub cost: ResourceAmount,
    /// Turns of construction.
    pub build_time: u32,
    /// Resources produced per turn once complete.
    #[serde(default)]
    pub income: ResourceAmount,
    /// Extra maximum shields granted to the host planet once complete.
    #[serde(default)]
    pub extra_shields: u32,
    /// Ship types this building can construct.
    #[serde(default)]
    pub ship_types: Vec<String>,
}

/// Statistics for one star type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarData {
    /// Footprint on the grid.
    pub dimension: Dimension,
}

/// Every content table, keyed by type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTables {
    /// Resource names, in display order.
    pub resources: Vec<String>,
    /// Ship types.
    pub ships: BTreeMap<String, ShipData>,
    /// Planet types.
    pub planets: BTreeMap<String, PlanetData>,
    /// Building types.
    pub buildings: BTreeMap<String, BuildingData>,
    /// Star types.
    pub stars: BTreeMap<String, StarData>,
    /// Footprint of portal props.
    pub portal_dimension: Dimension,
    /// Resources charged for each portal jump.
    pub jump_cost: ResourceAmount,
}

impl ContentTables {
    /// Shared handle to the bundled tables.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_TABLES)
    }

    /// Parse tables from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read tables from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_file(path)?)
    }

    /// Look up a ship type.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalActionError::UnknownContent`] for an unknown key.
    pub fn ship(&self, name: &str) -> Result<&ShipData, IllegalActionError> {
        lookup(&self.ships, "ship", name)
    }

    /// Look up a planet type.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalActionError::UnknownContent`] for an unknown key.
    pub fn planet(&self, name: &str) -> Result<&PlanetData, IllegalActionError> {
        lookup(&self.planets, "planet", name)
    }

    /// Look up a building type.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalActionError::UnknownContent`] for an unknown key.
    pub fn building(&self, name: &str) -> Result<&BuildingData, IllegalActionError> {
        lookup(&self.buildings, "building", name)
    }

    /// Look up a star type.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalActionError::UnknownContent`] for an unknown key.
    pub fn star(&self, name: &str) -> Result<&StarData, IllegalActionError> {
        lookup(&self.stars, "star", name)
    }

    /// Whether `name` is a known resource.
    #[must_use]
    pub fn has_resource(&self, name: &str) -> bool {
        self.resources.iter().any(|r| r == name)
    }
}

fn lookup<'a, T>(
    table: &'a BTreeMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<&'a T, IllegalActionError> {
    table.get(name).ok_or_else(|| IllegalActionError::UnknownContent {
        table: kind,
        name: name.to_owned(),
    })
}
