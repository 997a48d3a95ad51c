//! Turns: ordered batches of actions.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::action::{Action, ActionRegistry};
use crate::error::{EngineError, IllegalActionError};
use crate::state::GameState;

/// An ordered batch of actions resolved together.
///
/// Never holds two `MoveShip` actions for the same ship, and never holds
/// the same action twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Turn {
    actions: Vec<Action>,
}

impl Turn {
    /// An empty turn.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a turn from actions in order.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalActionError::DuplicateMove`] if two different moves
    /// target the same ship.
    pub fn from_actions(
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<Self, IllegalActionError> {
        let mut turn = Self::new();
        for action in actions {
            turn.push(action)?;
        }
        Ok(turn)
    }

    /// A resolved turn, already in canonical order.
    pub(crate) const fn resolved(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Append an action. Returns `false` if an identical action is already
    /// present; the turn is unchanged in that case.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalActionError::DuplicateMove`] if a different move
    /// for the same ship is already present.
    pub fn push(&mut self, action: Action) -> Result<bool, IllegalActionError> {
        if self.actions.contains(&action) {
            return Ok(false);
        }
        if let Some(ship) = action.kind().moved_ship()
            && self.actions.iter().any(|a| a.kind().moved_ship() == Some(ship))
        {
            return Err(IllegalActionError::DuplicateMove(ship));
        }
        self.actions.push(action);
        Ok(true)
    }

    /// Actions in order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Consume the turn, yielding its actions.
    #[must_use]
    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether there are no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Encode as `{"actions": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Encode as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a turn document against the live state.
    ///
    /// Actions that fail to decode or reference missing entities are
    /// discarded with a warning, as are repeated moves for one ship.
    ///
    /// # Errors
    ///
    /// Returns an error if the document has no `actions` array or any
    /// action has a missing or unknown `actiontype`.
    pub fn decode(
        value: &Value,
        registry: &ActionRegistry,
        state: &GameState,
    ) -> Result<Self, EngineError> {
        let entries = value
            .get("actions")
            .and_then(Value::as_array)
            .ok_or_else(|| EngineError::Malformed("turn without an actions array".to_owned()))?;
        let mut turn = Self::new();
        for (position, entry) in entries.iter().enumerate() {
            let pushed = registry.decode(entry, state)?.and_then(|action| turn.push(action));
            if let Err(error) = pushed {
                warn!(position, %error, "discarding action");
            }
        }
        Ok(turn)
    }

    /// Decode a turn from a JSON string.
    ///
    /// # Errors
    ///
    /// See [`Turn::decode`]; also fails on invalid JSON.
    pub fn from_json(
        json: &str,
        registry: &ActionRegistry,
        state: &GameState,
    ) -> Result<Self, EngineError> {
        let value: Value = serde_json::from_str(json)?;
        Self::decode(&value, registry, state)
    }
}
