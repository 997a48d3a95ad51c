//! Turn resolution.
//!
//! A turn resolves in a fixed phase order:
//!
//! 1. **Combat**: shots and bombardments, against pre-move positions.
//! 2. **Movement**: moves are bagged by swept cells and played back in
//!    rounds (see [`bagging`] and [`MovePlayback`]). A ship destroyed in
//!    combat loses its move.
//! 3. **Remaining actions**, in submission order.
//! 4. **Income**: one `ChangeResource` per player and resource.
//!
//! Damage, jump exits and launch locations are rolled before combat. The
//! resolved turn lists applied actions in submission order followed by
//! income, and is the canonical record of what happened.

pub mod bagging;
mod combat;
mod income;
mod playback;

pub use bagging::{BagOfMoves, PlannedMove, assign_greedy, bag_moves, merge_to_fixpoint};
pub use income::income_actions;
pub use playback::{MoveInFlight, MovePlayback};

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::action::{Action, ActionKind, Outcome};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pathfinding::{ShipContext, ShipPath};
use crate::state::{GameState, PropId, assert_invariants};
use crate::turn::Turn;

/// Plan one move for bagging. Returns `None` for non-moves and for moves
/// whose ship is no longer on a grid.
///
/// For a move that is valid now, the route the ship would take is
/// committed to the move. The sweep covers that route plus the requested
/// destination; without a route it is just the start and the destination.
#[must_use]
pub fn plan_move(state: &GameState, index: usize, action: &Action) -> Option<PlannedMove> {
    let ActionKind::MoveShip(step) = action.kind() else {
        return None;
    };
    let ship = ShipContext::resolve(state, step.ship).ok()?;
    let start = ship.prop.location;
    let plan = step.plan(state).filter(|_| action.is_valid(state));
    let mut sweep = plan.as_ref().map_or_else(|| vec![start], |plan| plan.route.clone());
    sweep.push(start.moved_to(step.destination));
    let path = ShipPath::from_route(step.ship, &sweep);
    let planned = PlannedMove::new(index, ship.solar.id(), action.clone(), path);
    Some(match plan {
        Some(plan) => planned.with_plan(plan),
        None => planned,
    })
}

/// Plan every move of a turn, in submission order.
#[must_use]
pub fn plan_moves(state: &GameState, actions: &[Action]) -> Vec<PlannedMove> {
    actions
        .par_iter()
        .enumerate()
        .filter_map(|(index, action)| plan_move(state, index, action))
        .collect()
}

/// A turn part-way through resolution.
///
/// Created by [`TurnResolution::begin`], which runs combat and bags the
/// moves. Moves are then played back with [`TurnResolution::next_round`]
/// and [`TurnResolution::acknowledge`], and [`TurnResolution::finish`]
/// runs the remaining phases.
#[derive(Debug, Clone)]
pub struct TurnResolution {
    actions: Vec<Action>,
    outcomes: Vec<Option<Action>>,
    playback: MovePlayback,
}

impl TurnResolution {
    /// Roll server-side parameters, resolve combat and bag the moves.
    ///
    /// # Errors
    ///
    /// Returns an error if combat hits corrupted state.
    pub fn begin<R: Rng + ?Sized>(
        state: &mut GameState,
        turn: Turn,
        rng: &mut R,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let actions: Vec<Action> = turn
            .into_actions()
            .iter()
            .map(|action| action.rolled(state, rng, config.damage_floor_percent))
            .collect();
        info!(turn = state.turn, actions = actions.len(), "resolving turn");

        let mut outcomes = vec![None; actions.len()];
        let fired = combat::resolve(state, &actions, &mut outcomes)?;

        let submitted = actions.iter().filter(|a| a.kind().moved_ship().is_some()).count();
        let planned = plan_moves(state, &actions);
        if planned.len() < submitted {
            debug!(lost = submitted - planned.len(), "moves lost with their ships");
        }
        let bags = bag_moves(planned);
        info!(fired, moves = submitted, bags = bags.len(), "combat resolved, moves bagged");

        Ok(Self {
            actions,
            outcomes,
            playback: MovePlayback::new(bags),
        })
    }

    /// Start the next movement round. Empty once movement is over.
    ///
    /// # Errors
    ///
    /// See [`MovePlayback::next_round`].
    pub fn next_round(&mut self, state: &mut GameState) -> Result<Vec<MoveInFlight>, EngineError> {
        self.playback.next_round(state)
    }

    /// Acknowledge one in-flight move. Returns how many are still pending.
    ///
    /// # Errors
    ///
    /// See [`MovePlayback::acknowledge`].
    pub fn acknowledge(&mut self, ship: PropId) -> Result<usize, EngineError> {
        self.playback.acknowledge(ship)
    }

    /// Moves awaiting acknowledgement.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.playback.pending()
    }

    /// Whether movement is over.
    #[must_use]
    pub fn is_moving_done(&self) -> bool {
        self.playback.is_drained()
    }

    /// Run the remaining actions and income, then close the turn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RoundPending`] if movement is not over, or
    /// any fatal error from executing an action.
    pub fn finish(
        mut self,
        state: &mut GameState,
        config: &EngineConfig,
    ) -> Result<Turn, EngineError> {
        if !self.playback.is_drained() {
            return Err(EngineError::RoundPending(self.playback.pending()));
        }
        for (index, record) in self.playback.take_applied() {
            if let Some(slot) = self.outcomes.get_mut(index) {
                *slot = Some(record);
            }
        }

        for (action, outcome) in self.actions.iter().zip(self.outcomes.iter_mut()) {
            let kind = action.kind();
            if kind.is_combat() || kind.moved_ship().is_some() {
                continue;
            }
            if let Outcome::Applied(record) = action.execute(state)? {
                *outcome = Some(record);
            }
        }

        let mut income = Vec::new();
        for action in income_actions(state, config.emit_zero_income) {
            if let Outcome::Applied(record) = action.execute(state)? {
                income.push(record);
            }
        }

        let applied: Vec<Action> = self.outcomes.into_iter().flatten().collect();
        info!(
            turn = state.turn,
            submitted = self.actions.len(),
            applied = applied.len(),
            income = income.len(),
            "turn resolved"
        );
        state.advance_turn();
        assert_invariants(state);
        Ok(Turn::resolved(applied.into_iter().chain(income).collect()))
    }
}

/// Resolve a whole turn, acknowledging every move immediately.
///
/// # Errors
///
/// Returns an error only for pipeline-fatal conditions; invalid actions
/// are dropped from the result.
pub fn resolve_turn<R: Rng + ?Sized>(
    state: &mut GameState,
    turn: Turn,
    rng: &mut R,
    config: &EngineConfig,
) -> Result<Turn, EngineError> {
    let mut resolution = TurnResolution::begin(state, turn, rng, config)?;
    resolution.playback.run_to_completion(state)?;
    resolution.finish(state, config)
}
