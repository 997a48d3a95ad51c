//! The turn engine: single owner of the game state.

use std::collections::{BTreeSet, VecDeque};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::info;

use crate::action::ActionRegistry;
use crate::config::EngineConfig;
use crate::error::{EngineError, IllegalActionError};
use crate::geometry::{GridLocation, Point};
use crate::pathfinding::{ShipContext, find_route, ship_reachable_set};
use crate::pipeline::{self, MoveInFlight, TurnResolution};
use crate::state::{GameState, PropId};
use crate::turn::Turn;

/// Where an acknowledged turn stands after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A movement round started; acknowledge each of these moves.
    Moving(Vec<MoveInFlight>),
    /// Moves of the current round are still unacknowledged.
    Waiting {
        /// How many.
        pending: usize,
    },
    /// The turn is over; this is its canonical record.
    Resolved(Turn),
}

/// Resolves turns against one game state.
///
/// Turns are resolved strictly one at a time. [`TurnEngine::resolve_turn`]
/// runs a turn start to finish. The acknowledged variant steps through
/// movement rounds instead: [`TurnEngine::begin_next_turn`] takes the next
/// queued turn and [`TurnEngine::acknowledge_move`] advances it.
#[derive(Debug)]
pub struct TurnEngine {
    state: GameState,
    config: EngineConfig,
    registry: ActionRegistry,
    rng: ChaCha8Rng,
    queue: VecDeque<Turn>,
    in_progress: Option<TurnResolution>,
}

impl TurnEngine {
    /// An engine over `state`, seeding its RNG from `config`.
    #[must_use]
    pub fn new(state: GameState, config: EngineConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            state,
            config,
            registry: ActionRegistry::standard(),
            rng,
            queue: VecDeque::new(),
            in_progress: None,
        }
    }

    /// The live game state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Consume the engine, yielding the game state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The action registry used for decoding.
    #[must_use]
    pub const fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Whether an acknowledged turn is underway.
    #[must_use]
    pub const fn is_turn_in_progress(&self) -> bool {
        self.in_progress.is_some()
    }

    /// Turns waiting to be resolved.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Queue a turn for resolution.
    pub fn submit_turn(&mut self, turn: Turn) {
        self.queue.push_back(turn);
    }

    /// Resolve `turn` immediately with every move auto-acknowledged.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TurnInProgress`] while an acknowledged turn
    /// is underway, or any pipeline-fatal error.
    pub fn resolve_turn(&mut self, turn: Turn) -> Result<Turn, EngineError> {
        if self.in_progress.is_some() {
            return Err(EngineError::TurnInProgress);
        }
        pipeline::resolve_turn(&mut self.state, turn, &mut self.rng, &self.config)
    }

    /// Resolve every queued turn in submission order.
    ///
    /// # Errors
    ///
    /// As [`TurnEngine::resolve_turn`]; turns after a failed one stay
    /// queued.
    pub fn resolve_queued(&mut self) -> Result<Vec<Turn>, EngineError> {
        if self.in_progress.is_some() {
            return Err(EngineError::TurnInProgress);
        }
        let mut resolved = Vec::with_capacity(self.queue.len());
        while let Some(turn) = self.queue.pop_front() {
            resolved.push(self.resolve_turn(turn)?);
        }
        Ok(resolved)
    }

    /// Start resolving the next queued turn. Returns `None` if the queue
    /// is empty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TurnInProgress`] if a turn is underway, or
    /// any pipeline-fatal error.
    pub fn begin_next_turn(&mut self) -> Result<Option<Progress>, EngineError> {
        if self.in_progress.is_some() {
            return Err(EngineError::TurnInProgress);
        }
        let Some(turn) = self.queue.pop_front() else {
            return Ok(None);
        };
        let resolution = TurnResolution::begin(&mut self.state, turn, &mut self.rng, &self.config)?;
        self.in_progress = Some(resolution);
        self.advance().map(Some)
    }

    /// Acknowledge the in-flight move of `ship`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoTurnInProgress`] outside a turn,
    /// [`EngineError::UnknownAcknowledgement`] if `ship` has no move in
    /// flight, or any pipeline-fatal error.
    pub fn acknowledge_move(&mut self, ship: PropId) -> Result<Progress, EngineError> {
        let resolution = self.in_progress.as_mut().ok_or(EngineError::NoTurnInProgress)?;
        let pending = resolution.acknowledge(ship)?;
        if pending > 0 {
            return Ok(Progress::Waiting { pending });
        }
        self.advance()
    }

    fn advance(&mut self) -> Result<Progress, EngineError> {
        let resolution = self.in_progress.as_mut().ok_or(EngineError::NoTurnInProgress)?;
        let started = resolution.next_round(&mut self.state)?;
        if !started.is_empty() {
            return Ok(Progress::Moving(started));
        }
        let resolution = self.in_progress.take().ok_or(EngineError::NoTurnInProgress)?;
        let turn = resolution.finish(&mut self.state, &self.config)?;
        info!(turn = self.state.turn, "acknowledged turn complete");
        Ok(Progress::Resolved(turn))
    }

    /// Cells `ship` may move to this turn.
    ///
    /// # Errors
    ///
    /// Returns an error if `ship` is not a ship on a grid.
    pub fn reachable_set(&self, ship: PropId) -> Result<BTreeSet<Point>, IllegalActionError> {
        ship_reachable_set(&self.state, ship)
    }

    /// Shortest route for `ship` to `destination`, ignoring speed.
    ///
    /// # Errors
    ///
    /// Returns an error if `ship` is not a ship on a grid.
    pub fn find_route(
        &self,
        ship: PropId,
        destination: Point,
    ) -> Result<Option<Vec<GridLocation>>, IllegalActionError> {
        let context = ShipContext::resolve(&self.state, ship)?;
        Ok(find_route(context.solar, context.prop.location, destination, Some(ship)))
    }

    /// Decode a turn document against the live state.
    ///
    /// # Errors
    ///
    /// See [`Turn::decode`].
    pub fn decode_turn(&self, value: &Value) -> Result<Turn, EngineError> {
        Turn::decode(value, &self.registry, &self.state)
    }

    /// Decode a turn from a JSON string.
    ///
    /// # Errors
    ///
    /// See [`Turn::from_json`].
    pub fn decode_turn_json(&self, json: &str) -> Result<Turn, EngineError> {
        Turn::from_json(json, &self.registry, &self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::fixtures::{at, galaxy};
    use crate::action::{Action, MoveShip};

    fn engine() -> (TurnEngine, PropId, PropId) {
        let (mut state, solar) = galaxy();
        let a = state.spawn_ship(solar, 1, "scout", at(0, 2)).unwrap();
        let b = state.spawn_ship(solar, 2, "scout", at(2, 0)).unwrap();
        (TurnEngine::new(state, EngineConfig::default()), a, b)
    }

    fn crossing_turn(engine: &TurnEngine, a: PropId, b: PropId) -> Turn {
        Turn::from_actions([
            Action::new(1, MoveShip { ship: a, destination: at(4, 2) }, engine.state()).unwrap(),
            Action::new(2, MoveShip { ship: b, destination: at(2, 4) }, engine.state()).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_acknowledged_turn() {
        let (mut engine, a, b) = engine();
        let turn = crossing_turn(&engine, a, b);
        engine.submit_turn(turn);
        assert_eq!(engine.queued(), 1);

        let Some(Progress::Moving(first)) = engine.begin_next_turn().unwrap() else {
            panic!("expected a movement round");
        };
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].ship, a);
        assert!(matches!(engine.begin_next_turn(), Err(EngineError::TurnInProgress)));
        assert!(matches!(engine.resolve_turn(Turn::new()), Err(EngineError::TurnInProgress)));

        let Progress::Moving(second) = engine.acknowledge_move(a).unwrap() else {
            panic!("expected a second round");
        };
        assert_eq!(second[0].ship, b);
        let Progress::Resolved(turn) = engine.acknowledge_move(b).unwrap() else {
            panic!("expected the turn to resolve");
        };
        assert_eq!(turn.actions().iter().filter(|a| a.kind().moved_ship().is_some()).count(), 2);
        assert!(!engine.is_turn_in_progress());
        assert_eq!(engine.state().turn, 1);
        assert!(engine.begin_next_turn().unwrap().is_none());
    }

    #[test]
    fn test_acknowledge_outside_turn() {
        let (mut engine, a, _) = engine();
        assert!(matches!(engine.acknowledge_move(a), Err(EngineError::NoTurnInProgress)));
    }

    #[test]
    fn test_turn_without_moves_resolves_at_once() {
        let (mut engine, _, _) = engine();
        engine.submit_turn(Turn::new());
        let progress = engine.begin_next_turn().unwrap().unwrap();
        assert!(matches!(progress, Progress::Resolved(_)));
    }

    #[test]
    fn test_same_seed_same_result() {
        let run = || {
            let (mut engine, a, b) = engine();
            let turn = crossing_turn(&engine, a, b);
            engine.submit_turn(turn.clone());
            engine.submit_turn(Turn::new());
            let resolved = engine.resolve_queued().unwrap();
            (resolved, engine.into_state())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_preview_queries() {
        let (engine, a, _) = engine();
        assert!(engine.reachable_set(a).unwrap().contains(&at(3, 2)));
        let route = engine.find_route(a, at(3, 2)).unwrap().unwrap();
        assert_eq!(route.len(), 4);
        assert!(engine.reachable_set(PropId(99)).is_err());
    }
}
