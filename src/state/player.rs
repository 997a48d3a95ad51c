//! Player types.

use serde::{Deserialize, Serialize};

use crate::state::ResourceAmount;

/// Player identifier. Neutral props carry no player at all.
pub type PlayerId = u8;

/// A participant in the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player ID.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Resource stockpile; never negative.
    pub resources: ResourceAmount,
}

impl Player {
    /// Create a player with an empty stockpile.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            resources: ResourceAmount::new(),
        }
    }

    /// Builder-style stockpile setter.
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceAmount) -> Self {
        self.resources = resources;
        self
    }

    /// Whether the stockpile covers `cost`.
    #[must_use]
    pub fn can_afford(&self, cost: &ResourceAmount) -> bool {
        self.resources.covers(cost)
    }
}
