//! State-mutating commands.
//!
//! Every action is a [`Action`]: the acting player plus one concrete
//! [`ActionKind`] variant. Lifecycle:
//!
//! ```text
//! constructed --check_references--> Action
//!     --execute--> is_valid? --yes--> apply --> Outcome::Applied
//!                            --no---> Outcome::Dropped
//! ```
//!
//! Construction failures are [`IllegalActionError`]s. Failing validation at
//! resolution time is not an error: the action is dropped from the
//! canonical turn.

mod checks;
mod combat;
mod construction;
mod maintenance;
mod movement;
mod planet;
mod registry;

pub use combat::{BombPlanet, ShootShip};
pub use construction::{CancelShipConstruction, ConstructShip, IncrementShipConstruction};
pub use maintenance::{ChangeResource, RegeneratePlanet, RegenerateShip};
pub use movement::{EnterCargo, JumpShip, LeaveCargo, MoveShip};
pub use planet::{CapturePlanet, DestroyBuilding, IncrementBuildingConstruction};
pub use registry::{ActionDecoder, ActionRegistry};

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, IllegalActionError};
use crate::pathfinding::RoutePlan;
use crate::state::{GameState, PlayerId, PropId};

/// What applying an action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Applied {
    /// The action took effect exactly as issued.
    AsIssued,
    /// The action took effect with different parameters, recorded as given.
    Rewritten(ActionKind),
    /// The action was valid but changed nothing.
    NoEffect,
}

/// Behaviour shared by every concrete action payload.
pub(crate) trait ActionEffect {
    /// Construction-time checks: referenced entities exist and have the
    /// right kind.
    fn check_references(&self, state: &GameState) -> Result<(), IllegalActionError>;

    /// Type-specific validity against the live state.
    fn is_valid(&self, actor: PlayerId, state: &GameState) -> bool;

    /// Mutate the state. Only called right after `is_valid` returned true.
    fn apply(&self, actor: PlayerId, state: &mut GameState) -> Result<Applied, EngineError>;

    /// Human-readable summary.
    fn describe(&self, actor: PlayerId, state: &GameState) -> String;
}

macro_rules! action_kinds {
    ($($variant:ident),+ $(,)?) => {
        /// Every concrete action.
        ///
        /// Encoded with an `actiontype` tag naming the variant.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(tag = "actiontype")]
        pub enum ActionKind {
            $(
                #[doc = concat!("See [`", stringify!($variant), "`].")]
                $variant($variant),
            )+
        }

        impl ActionKind {
            /// The `actiontype` tag of this variant.
            #[must_use]
            pub const fn tag(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant),)+
                }
            }

            fn effect(&self) -> &dyn ActionEffect {
                match self {
                    $(Self::$variant(payload) => payload,)+
                }
            }
        }

        $(
            impl From<$variant> for ActionKind {
                fn from(payload: $variant) -> Self {
                    Self::$variant(payload)
                }
            }
        )+
    };
}

action_kinds!(
    MoveShip,
    ShootShip,
    BombPlanet,
    CapturePlanet,
    JumpShip,
    EnterCargo,
    LeaveCargo,
    ConstructShip,
    IncrementBuildingConstruction,
    IncrementShipConstruction,
    CancelShipConstruction,
    DestroyBuilding,
    ChangeResource,
    RegenerateShip,
    RegeneratePlanet,
);

impl ActionKind {
    /// Whether this is resolved in the combat phase.
    #[must_use]
    pub const fn is_combat(&self) -> bool {
        matches!(self, Self::ShootShip(_) | Self::BombPlanet(_))
    }

    /// The moved ship, if this is a plain move.
    #[must_use]
    pub const fn moved_ship(&self) -> Option<PropId> {
        match self {
            Self::MoveShip(m) => Some(m.ship),
            _ => None,
        }
    }

    /// Fill in parameters the server decides. Damage is always rolled;
    /// spawn and exit locations only when the client left them out.
    #[must_use]
    pub(crate) fn roll<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        rng: &mut R,
        damage_floor_percent: u32,
    ) -> Self {
        match self {
            Self::ShootShip(shot) => Self::ShootShip(shot.rolled(state, rng, damage_floor_percent)),
            Self::BombPlanet(bomb) => {
                Self::BombPlanet(bomb.rolled(state, rng, damage_floor_percent))
            }
            Self::JumpShip(jump) => Self::JumpShip(jump.rolled(state, rng)),
            Self::IncrementShipConstruction(build) => {
                Self::IncrementShipConstruction(build.rolled(state, rng))
            }
            other => other.clone(),
        }
    }
}

/// A command issued by one player.
///
/// Immutable once constructed. Equality is structural, so replaying the
/// same action twice can be detected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Action {
    player: PlayerId,
    #[serde(flatten)]
    kind: ActionKind,
}

/// Result of executing an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action took effect; this is its canonical record.
    Applied(Action),
    /// The action was invalid or had no effect and is not recorded.
    Dropped,
}

impl Action {
    /// Build an action, checking that everything it references exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unknown or a referenced prop,
    /// building slot, content type or resource is missing or of the wrong
    /// kind.
    pub fn new(
        player: PlayerId,
        kind: impl Into<ActionKind>,
        state: &GameState,
    ) -> Result<Self, IllegalActionError> {
        let kind = kind.into();
        if state.get_player(player).is_none() {
            return Err(IllegalActionError::UnknownPlayer(player));
        }
        kind.effect().check_references(state)?;
        Ok(Self { player, kind })
    }

    pub(crate) const fn from_parts(player: PlayerId, kind: ActionKind) -> Self {
        Self { player, kind }
    }

    /// The acting player.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// The concrete command.
    #[must_use]
    pub const fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Whether the action may run against the current state: the actor
    /// still exists and the type-specific check passes.
    #[must_use]
    pub fn is_valid(&self, state: &GameState) -> bool {
        state.get_player(self.player).is_some() && self.kind.effect().is_valid(self.player, state)
    }

    /// Validate, then apply.
    ///
    /// # Errors
    ///
    /// Only pipeline-fatal conditions are errors. An invalid action
    /// returns `Ok(Outcome::Dropped)`.
    pub fn execute(&self, state: &mut GameState) -> Result<Outcome, EngineError> {
        if !self.is_valid(state) {
            debug!(player = self.player, action = self.kind.tag(), "dropped invalid action");
            return Ok(Outcome::Dropped);
        }
        let applied = self.kind.effect().apply(self.player, state)?;
        Ok(self.outcome(applied))
    }

    /// Execute a move along a route committed before playback started.
    ///
    /// Non-moves, moves of vanished players and routes that are no longer
    /// clear are dropped.
    ///
    /// # Errors
    ///
    /// Only pipeline-fatal conditions are errors.
    pub(crate) fn follow_route(
        &self,
        state: &mut GameState,
        plan: &RoutePlan,
    ) -> Result<Outcome, EngineError> {
        let ActionKind::MoveShip(step) = &self.kind else {
            return Ok(Outcome::Dropped);
        };
        if state.get_player(self.player).is_none() || !step.can_follow(self.player, state, plan) {
            debug!(player = self.player, ship = %step.ship, "dropped move with blocked route");
            return Ok(Outcome::Dropped);
        }
        let applied = step.follow(state, plan)?;
        Ok(self.outcome(applied))
    }

    fn outcome(&self, applied: Applied) -> Outcome {
        match applied {
            Applied::AsIssued => Outcome::Applied(self.clone()),
            Applied::Rewritten(kind) => Outcome::Applied(Self::from_parts(self.player, kind)),
            Applied::NoEffect => {
                debug!(player = self.player, action = self.kind.tag(), "action had no effect");
                Outcome::Dropped
            }
        }
    }

    /// This action with server-decided parameters filled in.
    #[must_use]
    pub(crate) fn rolled<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        rng: &mut R,
        damage_floor_percent: u32,
    ) -> Self {
        Self::from_parts(self.player, self.kind.roll(state, rng, damage_floor_percent))
    }

    /// Human-readable summary.
    #[must_use]
    pub fn describe(&self, state: &GameState) -> String {
        self.kind.effect().describe(self.player, state)
    }

    /// Encode as a JSON object with an `actiontype` tag.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{at, galaxy};
    use super::*;

    #[test]
    fn test_new_rejects_unknown_player() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let err = Action::new(9, MoveShip { ship, destination: at(1, 0) }, &state).unwrap_err();
        assert_eq!(err, IllegalActionError::UnknownPlayer(9));
    }

    #[test]
    fn test_new_rejects_wrong_kind() {
        let (mut state, solar) = galaxy();
        let star = state.spawn_star(solar, "yellow_dwarf", at(5, 5)).unwrap();
        let wrong = MoveShip {
            ship: star,
            destination: at(1, 0),
        };
        let err = Action::new(1, wrong, &state).unwrap_err();
        assert!(matches!(err, IllegalActionError::WrongPropKind { .. }));
    }

    #[test]
    fn test_execute_drops_when_actor_gone() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let action = Action::new(1, MoveShip { ship, destination: at(1, 0) }, &state).unwrap();
        state.players_mut_for_tests().retain(|p| p.id != 1);
        assert_eq!(action.execute(&mut state).unwrap(), Outcome::Dropped);
        assert_eq!(state.prop(ship).unwrap().location.origin, at(0, 0));
    }

    #[test]
    fn test_structural_equality() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let a = Action::new(1, MoveShip { ship, destination: at(2, 0) }, &state).unwrap();
        let b = Action::new(1, MoveShip { ship, destination: at(2, 0) }, &state).unwrap();
        let c = Action::new(1, MoveShip { ship, destination: at(3, 0) }, &state).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_encode_has_tag_and_player() {
        let (mut state, solar) = galaxy();
        let ship = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let action = Action::new(1, MoveShip { ship, destination: at(2, 0) }, &state).unwrap();
        let value = action.encode().unwrap();
        assert_eq!(value["actiontype"], "MoveShip");
        assert_eq!(value["player"], 1);
        assert_eq!(value["destination"]["x"], 2);
    }
}
