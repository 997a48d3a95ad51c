//! Planet buildings.

use serde::{Deserialize, Serialize};

use crate::content::BuildingData;

/// Building identifier, issued by the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(pub u32);

/// A ship being assembled by a building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipConstruction {
    /// Ship type key.
    pub ship_type: String,
    /// Turns invested so far.
    pub progress: u32,
}

/// A structure occupying one planet slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Building ID.
    pub id: BuildingId,
    /// Slot on the host planet.
    pub slot: u32,
    /// Building type key.
    pub building_type: String,
    /// Turns of construction invested so far.
    pub progress: u32,
    /// Ship under construction, if any.
    #[serde(default)]
    pub ship_construction: Option<ShipConstruction>,
}

impl Building {
    /// A fresh, unbuilt building.
    #[must_use]
    pub fn new(id: BuildingId, slot: u32, building_type: impl Into<String>) -> Self {
        Self {
            id,
            slot,
            building_type: building_type.into(),
            progress: 0,
            ship_construction: None,
        }
    }

    /// Whether construction has finished.
    #[must_use]
    pub const fn is_complete(&self, data: &BuildingData) -> bool {
        self.progress >= data.build_time
    }
}
