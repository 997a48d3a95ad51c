//! Decoding actions from JSON by their `actiontype` tag.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::action::{
    Action, ActionKind, BombPlanet, CancelShipConstruction, CapturePlanet, ChangeResource,
    ConstructShip, DestroyBuilding, EnterCargo, IncrementBuildingConstruction,
    IncrementShipConstruction, JumpShip, LeaveCargo, MoveShip, RegeneratePlanet, RegenerateShip,
    ShootShip,
};
use crate::error::{EngineError, IllegalActionError};
use crate::state::{GameState, PlayerId};

/// Decodes the payload of one action type.
pub type ActionDecoder = fn(&Value) -> Result<ActionKind, serde_json::Error>;

fn decoder<T>(value: &Value) -> Result<ActionKind, serde_json::Error>
where
    T: DeserializeOwned + Into<ActionKind>,
{
    <T as Deserialize>::deserialize(value).map(Into::into)
}

/// Maps `actiontype` tags to payload decoders.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    decoders: BTreeMap<&'static str, ActionDecoder>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActionRegistry {
    /// Registry with every built-in action type.
    #[must_use]
    pub fn standard() -> Self {
        let entries: [(&'static str, ActionDecoder); 15] = [
            ("MoveShip", decoder::<MoveShip>),
            ("ShootShip", decoder::<ShootShip>),
            ("BombPlanet", decoder::<BombPlanet>),
            ("CapturePlanet", decoder::<CapturePlanet>),
            ("JumpShip", decoder::<JumpShip>),
            ("EnterCargo", decoder::<EnterCargo>),
            ("LeaveCargo", decoder::<LeaveCargo>),
            ("ConstructShip", decoder::<ConstructShip>),
            ("IncrementBuildingConstruction", decoder::<IncrementBuildingConstruction>),
            ("IncrementShipConstruction", decoder::<IncrementShipConstruction>),
            ("CancelShipConstruction", decoder::<CancelShipConstruction>),
            ("DestroyBuilding", decoder::<DestroyBuilding>),
            ("ChangeResource", decoder::<ChangeResource>),
            ("RegenerateShip", decoder::<RegenerateShip>),
            ("RegeneratePlanet", decoder::<RegeneratePlanet>),
        ];
        Self {
            decoders: entries.into_iter().collect(),
        }
    }

    /// The decoder for `tag`, if registered.
    #[must_use]
    pub fn lookup(&self, tag: &str) -> Option<ActionDecoder> {
        self.decoders.get(tag).copied()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.keys().copied()
    }

    /// Decode one action object against the live state.
    ///
    /// The outer `Result` carries turn-fatal problems: a value that is not
    /// an object, a missing or non-string `actiontype`, or an unknown tag.
    /// The inner one carries problems with this action alone, which the
    /// caller discards.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn decode(
        &self,
        value: &Value,
        state: &GameState,
    ) -> Result<Result<Action, IllegalActionError>, EngineError> {
        let object = value
            .as_object()
            .ok_or_else(|| EngineError::Malformed(format!("action is not an object: {value}")))?;
        let tag = object
            .get("actiontype")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EngineError::Malformed("action without a string actiontype".to_owned())
            })?;
        let decode = self
            .lookup(tag)
            .ok_or_else(|| EngineError::UnknownActionType(tag.to_owned()))?;

        let malformed = |reason: String| IllegalActionError::Malformed {
            action_type: tag.to_owned(),
            reason,
        };
        let player = match object.get("player").map(PlayerId::deserialize) {
            Some(Ok(player)) => player,
            Some(Err(e)) => return Ok(Err(malformed(format!("bad player: {e}")))),
            None => return Ok(Err(malformed("missing player".to_owned()))),
        };
        let kind = match decode(value) {
            Ok(kind) => kind,
            Err(e) => return Ok(Err(malformed(e.to_string()))),
        };
        Ok(Action::new(player, kind, state))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::action::fixtures::{at, galaxy};
    use crate::state::PropId;

    #[test]
    fn test_tags_match_variants() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let registry = ActionRegistry::standard();
        assert_eq!(registry.tags().count(), 15);
        let kind: ActionKind = MoveShip { ship, destination: at(1, 0) }.into();
        assert!(registry.lookup(kind.tag()).is_some());
    }

    #[test]
    fn test_decode_round_trips_encode() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "fighter", at(0, 0)).unwrap();
        let target = state.spawn_ship(solar, 2, "fighter", at(1, 0)).unwrap();
        let action = Action::new(1, ShootShip { ship, target, damage: 10 }, &state).unwrap();
        let decoded = ActionRegistry::standard()
            .decode(&action.encode().unwrap(), &state)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, action);
    }

    #[test]
    fn test_optional_fields_default() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "fighter", at(0, 0)).unwrap();
        let target = state.spawn_ship(solar, 2, "fighter", at(1, 0)).unwrap();
        let value = json!({"actiontype": "ShootShip", "player": 1, "ship": ship, "target": target});
        let decoded = ActionRegistry::standard().decode(&value, &state).unwrap().unwrap();
        assert_eq!(decoded.kind(), &ActionKind::ShootShip(ShootShip { ship, target, damage: 0 }));
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let (state, _) = galaxy();
        let value = json!({"actiontype": "Teleport", "player": 1});
        let err = ActionRegistry::standard().decode(&value, &state).unwrap_err();
        assert!(matches!(err, EngineError::UnknownActionType(tag) if tag == "Teleport"));
    }

    #[test]
    fn test_missing_tag_is_fatal() {
        let (state, _) = galaxy();
        let registry = ActionRegistry::standard();
        assert!(matches!(
            registry.decode(&json!({"player": 1}), &state),
            Err(EngineError::Malformed(_))
        ));
        assert!(matches!(
            registry.decode(&json!({"actiontype": 3, "player": 1}), &state),
            Err(EngineError::Malformed(_))
        ));
    }

    #[test]
    fn test_bad_payload_is_discardable() {
        let (state, _) = galaxy();
        let registry = ActionRegistry::standard();
        let bad_field = json!({"actiontype": "MoveShip", "player": 1, "ship": "first"});
        assert!(matches!(
            registry.decode(&bad_field, &state).unwrap(),
            Err(IllegalActionError::Malformed { .. })
        ));
        let missing = json!({
            "actiontype": "MoveShip",
            "player": 1,
            "ship": 99,
            "destination": {"x": 0, "y": 0}
        });
        assert_eq!(
            registry.decode(&missing, &state).unwrap(),
            Err(IllegalActionError::MissingProp(PropId(99)))
        );
    }
}
