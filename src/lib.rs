// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Voidreach: the authoritative turn-resolution engine of a grid-based
//! multiplayer space strategy game.
//!
//! Players submit batches of intents (move a ship, fire, build, jump
//! through a portal). The engine validates each one against the live
//! state, applies them in a fixed phase order, keeps simultaneous moves
//! from colliding and appends the income for the turn. The resolved turn
//! is the single source of truth broadcast back to every client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   TurnEngine (queue, RNG, preview)  │
//! ├─────────────────────────────────────┤
//! │   Pipeline: combat → movement       │
//! │   (bagging, playback) → rest → income│
//! ├─────────────────────────────────────┤
//! │   Actions (validate / apply)        │
//! ├─────────────────────────────────────┤
//! │   Pathfinding    │   GameState      │
//! ├─────────────────────────────────────┤
//! │   Geometry       │   Content tables │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use voidreach::{
//!     Action, ContentTables, EngineConfig, GameState, MoveShip, Player, Point, Turn,
//!     TurnEngine,
//! };
//! use voidreach::geometry::Dimension;
//!
//! let mut state = GameState::new(vec![Player::new(1, "Ada")], ContentTables::builtin());
//! let sol = state.add_solar_system("Sol", Dimension::new(10, 10).unwrap());
//! let scout = state.spawn_ship(sol, 1, "scout", Point::new(0, 0)).unwrap();
//!
//! let mut engine = TurnEngine::new(state, EngineConfig::default());
//! let step = MoveShip { ship: scout, destination: Point::new(3, 0) };
//! let turn = Turn::from_actions([Action::new(1, step, engine.state()).unwrap()]).unwrap();
//! let resolved = engine.resolve_turn(turn).unwrap();
//!
//! assert_eq!(engine.state().prop(scout).unwrap().location.origin, Point::new(3, 0));
//! assert!(!resolved.is_empty());
//! ```

pub mod action;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod galaxy;
pub mod geometry;
pub mod pathfinding;
pub mod pipeline;
pub mod state;
pub mod turn;

pub use action::{
    Action, ActionKind, ActionRegistry, BombPlanet, CancelShipConstruction, CapturePlanet,
    ChangeResource, ConstructShip, DestroyBuilding, EnterCargo, IncrementBuildingConstruction,
    IncrementShipConstruction, JumpShip, LeaveCargo, MoveShip, Outcome, RegeneratePlanet,
    RegenerateShip, ShootShip,
};
pub use config::{ConfigError, EngineConfig};
pub use content::ContentTables;
pub use engine::{Progress, TurnEngine};
pub use error::{EngineError, GeometryError, IllegalActionError, PlacementError};
pub use galaxy::{GalaxyConfig, GalaxyError, generate_galaxy};
pub use geometry::{GridLocation, Point};
pub use state::{GameState, Player, PlayerId, Prop, PropId, SolarId};
pub use turn::Turn;
