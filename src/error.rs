//! Error types for the turn engine.
//!
//! Gameplay rejections are not errors: an action that fails validation at
//! resolution time is dropped silently. The types here cover the cases that
//! must be reported:
//! - [`IllegalActionError`]: an action that cannot even be constructed
//! - [`PlacementError`]: a prop that does not fit where it was put
//! - [`EngineError`]: pipeline-fatal conditions surfaced to the caller

use thiserror::Error;

use crate::geometry::{Dimension, GridLocation};
use crate::state::{PlayerId, PropCategory, PropId, SolarId};

/// Invalid geometry values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// A dimension side was below 1.
    #[error("dimension {width}x{height} must be at least 1x1")]
    NonPositiveDimension {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
}

/// A prop could not be placed into a solar system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// The location leaves the solar system grid.
    #[error(
        "prop {prop} at {location} does not fit a {}x{} grid",
        .bounds.width(),
        .bounds.height()
    )]
    OutOfBounds {
        /// Prop being placed.
        prop: PropId,
        /// Requested location.
        location: GridLocation,
        /// Grid size.
        bounds: Dimension,
    },
    /// The location overlaps another prop.
    #[error("prop {prop} at {location} collides with prop {occupant}")]
    Occupied {
        /// Prop being placed.
        prop: PropId,
        /// Requested location.
        location: GridLocation,
        /// Prop already there.
        occupant: PropId,
    },
    /// A prop with this ID is already registered.
    #[error("prop id {0} is already in use")]
    DuplicateId(PropId),
    /// The target solar system does not exist.
    #[error("unknown solar system {0}")]
    UnknownSolarSystem(SolarId),
    /// The prop to move or remove does not exist.
    #[error("unknown prop {0}")]
    UnknownProp(PropId),
}

/// An action that could not be constructed.
///
/// Raised while building or decoding an action; the action never enters
/// the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalActionError {
    /// The acting player does not exist.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// A referenced prop does not exist.
    #[error("prop {0} does not exist")]
    MissingProp(PropId),
    /// A referenced prop has the wrong kind.
    #[error("prop {prop} is a {found}, expected a {expected}")]
    WrongPropKind {
        /// Referenced prop.
        prop: PropId,
        /// Kind the action needs.
        expected: PropCategory,
        /// Kind actually found.
        found: PropCategory,
    },
    /// A content type key is not in the content tables.
    #[error("unknown {table} type {name:?}")]
    UnknownContent {
        /// Table that was searched.
        table: &'static str,
        /// Missing key.
        name: String,
    },
    /// A resource name is not in the content tables.
    #[error("unknown resource {0:?}")]
    UnknownResource(String),
    /// The planet has no such building slot.
    #[error("planet {planet} has no building slot {slot}")]
    InvalidSlot {
        /// Planet referenced.
        planet: PropId,
        /// Slot requested.
        slot: u32,
    },
    /// The turn already moves this ship.
    #[error("ship {0} already has a move this turn")]
    DuplicateMove(PropId),
    /// The payload could not be decoded.
    #[error("malformed {action_type} action: {reason}")]
    Malformed {
        /// Type tag of the action.
        action_type: String,
        /// Decoder message.
        reason: String,
    },
}

/// Pipeline-fatal failures.
///
/// These indicate a protocol mismatch or a bug, never a gameplay race.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A turn document named an action type the registry does not know.
    #[error("unknown action type {0:?}")]
    UnknownActionType(String),
    /// A turn or state document is structurally broken.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// Decoding a document failed.
    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),
    /// The authoritative state is inconsistent.
    #[error("state corruption: {0}")]
    StateCorruption(String),
    /// A validated action failed to place a prop.
    #[error("placement failed after validation: {0}")]
    Placement(#[from] PlacementError),
    /// A preview query referenced an illegal target.
    #[error(transparent)]
    IllegalAction(#[from] IllegalActionError),
    /// A turn is still being resolved.
    #[error("a turn is already in progress")]
    TurnInProgress,
    /// No turn is being resolved.
    #[error("no turn is in progress")]
    NoTurnInProgress,
    /// A new movement round was requested before the current one finished.
    #[error("movement round still has {0} unacknowledged moves")]
    RoundPending(usize),
    /// The acknowledged ship is not in flight this round.
    #[error("ship {0} has no move in flight")]
    UnknownAcknowledgement(PropId),
}
