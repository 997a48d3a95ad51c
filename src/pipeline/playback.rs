//! Round-by-round execution of bagged moves.
//!
//! Each round pops the front move of every non-empty bag and executes it
//! along the route committed when it was bagged. If an earlier move of the
//! same bag has since blocked that route, the move is re-planned and kept
//! only if the new route stays inside its bag's cells. Applied moves stay
//! in flight until acknowledged; the next round cannot start before every
//! one of them is. Moves that turn out invalid are dropped without ever
//! going in flight.

use std::collections::BTreeSet;

use tracing::debug;

use crate::action::{Action, ActionKind, MoveShip, Outcome};
use crate::error::EngineError;
use crate::geometry::{GridLocation, Point};
use crate::pathfinding::{RoutePlan, ShipPath};
use crate::pipeline::bagging::{BagOfMoves, PlannedMove};
use crate::state::{GameState, PropId, SolarId};

/// The route `planned` flies now: the committed one while it is clear,
/// otherwise a fresh one for a still valid move, confined to `cells`.
fn committed_route(
    state: &GameState,
    planned: &PlannedMove,
    step: &MoveShip,
    cells: &BTreeSet<Point>,
) -> Option<RoutePlan> {
    let actor = planned.action().player();
    if let Some(plan) = planned.plan().filter(|plan| step.can_follow(actor, state, plan)) {
        return Some(plan.clone());
    }
    if !planned.action().is_valid(state) {
        return None;
    }
    let plan = step.plan(state)?;
    let inside = ShipPath::from_route(step.ship, &plan.route).cells().is_subset(cells);
    if !inside {
        debug!(ship = %step.ship, "re-planned route leaves its bag");
        return None;
    }
    Some(plan)
}

/// A move that has been applied and awaits acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInFlight {
    /// The moving ship.
    pub ship: PropId,
    /// Solar system it moves in.
    pub solar: SolarId,
    /// Footprints along the way, start and end included.
    pub route: Vec<GridLocation>,
}

/// Drives bagged moves through acknowledged rounds.
#[derive(Debug, Clone)]
pub struct MovePlayback {
    bags: Vec<BagOfMoves>,
    in_flight: BTreeSet<PropId>,
    applied: Vec<(usize, Action)>,
    round: usize,
}

impl MovePlayback {
    /// Playback over `bags`.
    #[must_use]
    pub const fn new(bags: Vec<BagOfMoves>) -> Self {
        Self {
            bags,
            in_flight: BTreeSet::new(),
            applied: Vec::new(),
            round: 0,
        }
    }

    /// Rounds started so far.
    #[must_use]
    pub const fn round(&self) -> usize {
        self.round
    }

    /// Moves awaiting acknowledgement.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether every move has run and been acknowledged.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.in_flight.is_empty() && self.bags.iter().all(BagOfMoves::is_empty)
    }

    /// Start the next round that puts at least one move in flight.
    ///
    /// Returns an empty list once every bag is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RoundPending`] while moves of the current
    /// round are unacknowledged, or any fatal error from executing a move.
    pub fn next_round(&mut self, state: &mut GameState) -> Result<Vec<MoveInFlight>, EngineError> {
        if !self.in_flight.is_empty() {
            return Err(EngineError::RoundPending(self.in_flight.len()));
        }
        while self.bags.iter().any(|bag| !bag.is_empty()) {
            self.round += 1;
            let mut started = Vec::new();
            for bag in &mut self.bags {
                let Some(planned) = bag.pop_front() else {
                    continue;
                };
                let ActionKind::MoveShip(step) = planned.action().kind() else {
                    continue;
                };
                let Some(plan) = committed_route(state, &planned, step, bag.cells()) else {
                    debug!(ship = %step.ship, "move dropped during playback");
                    continue;
                };
                match planned.action().follow_route(state, &plan)? {
                    Outcome::Applied(record) => {
                        self.in_flight.insert(step.ship);
                        self.applied.push((planned.index(), record));
                        started.push(MoveInFlight {
                            ship: step.ship,
                            solar: bag.solar(),
                            route: plan.route,
                        });
                    }
                    Outcome::Dropped => debug!(ship = %step.ship, "move dropped during playback"),
                }
            }
            debug!(round = self.round, started = started.len(), "movement round");
            if !started.is_empty() {
                return Ok(started);
            }
        }
        Ok(Vec::new())
    }

    /// Acknowledge the move of `ship`. Returns how many moves of the
    /// round are still pending.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAcknowledgement`] if `ship` has no
    /// move in flight.
    pub fn acknowledge(&mut self, ship: PropId) -> Result<usize, EngineError> {
        if !self.in_flight.remove(&ship) {
            return Err(EngineError::UnknownAcknowledgement(ship));
        }
        Ok(self.in_flight.len())
    }

    /// Run every remaining round, acknowledging moves as they start.
    ///
    /// # Errors
    ///
    /// As [`MovePlayback::next_round`].
    pub fn run_to_completion(&mut self, state: &mut GameState) -> Result<(), EngineError> {
        loop {
            let started = self.next_round(state)?;
            if started.is_empty() {
                return Ok(());
            }
            for step in started {
                self.acknowledge(step.ship)?;
            }
        }
    }

    /// Canonical records of applied moves with their submission index.
    pub(crate) fn take_applied(&mut self) -> Vec<(usize, Action)> {
        std::mem::take(&mut self.applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::fixtures::{at, galaxy};
    use crate::pipeline::{bag_moves, plan_moves};

    fn playback(state: &mut GameState, moves: &[(PropId, (i32, i32))]) -> MovePlayback {
        let actions: Vec<Action> = moves
            .iter()
            .map(|&(ship, (x, y))| {
                let destination = at(x, y);
                Action::new(1, MoveShip { ship, destination }, state).unwrap()
            })
            .collect();
        MovePlayback::new(bag_moves(plan_moves(state, &actions)))
    }

    #[test]
    fn test_independent_bags_move_together() {
        let (mut state, solar) = galaxy();
        let a = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let b = state.spawn_ship(solar, 1, "scout", at(0, 5)).unwrap();
        let mut playback = playback(&mut state, &[(a, (3, 0)), (b, (3, 5))]);

        let round = playback.next_round(&mut state).unwrap();
        assert_eq!(round.len(), 2);
        assert_eq!(round[0].route.first().unwrap().origin, at(0, 0));
        assert_eq!(round[0].route.last().unwrap().origin, at(3, 0));
        assert_eq!(playback.acknowledge(a).unwrap(), 1);
        assert_eq!(playback.acknowledge(b).unwrap(), 0);
        assert!(playback.next_round(&mut state).unwrap().is_empty());
        assert!(playback.is_drained());
    }

    #[test]
    fn test_round_barrier() {
        let (mut state, solar) = galaxy();
        let a = state.spawn_ship(solar, 1, "scout", at(0, 2)).unwrap();
        let b = state.spawn_ship(solar, 1, "scout", at(2, 0)).unwrap();
        let mut playback = playback(&mut state, &[(a, (4, 2)), (b, (2, 4))]);

        let first = playback.next_round(&mut state).unwrap();
        assert_eq!(first.len(), 1);
        assert!(matches!(playback.next_round(&mut state), Err(EngineError::RoundPending(1))));
        assert!(matches!(
            playback.acknowledge(b),
            Err(EngineError::UnknownAcknowledgement(ship)) if ship == b
        ));
        playback.acknowledge(a).unwrap();

        let second = playback.next_round(&mut state).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].ship, b);
        playback.acknowledge(b).unwrap();
        assert!(playback.is_drained());
        assert_eq!(playback.round(), 2);
    }

    #[test]
    fn test_moves_fly_the_routes_they_were_bagged_with() {
        let (mut state, solar) = galaxy();
        let down = state.spawn_ship(solar, 1, "scout", at(2, 5)).unwrap();
        let across = state.spawn_ship(solar, 1, "scout", at(0, 5)).unwrap();
        let actions = [
            Action::new(1, MoveShip { ship: down, destination: at(2, 10) }, &state).unwrap(),
            Action::new(1, MoveShip { ship: across, destination: at(4, 5) }, &state).unwrap(),
        ];
        let bags = bag_moves(plan_moves(&state, &actions));
        assert_eq!(bags.len(), 2);
        let bag_cells: Vec<BTreeSet<Point>> = bags.iter().map(|bag| bag.cells().clone()).collect();
        let mut playback = MovePlayback::new(bags);

        // `down` leaves (2, 5) first; `across` must still detour around it.
        let round = playback.next_round(&mut state).unwrap();
        assert_eq!(round.len(), 2);
        let swept: Vec<BTreeSet<Point>> = round
            .iter()
            .map(|step| ShipPath::from_route(step.ship, &step.route).cells().clone())
            .collect();
        assert!(swept[0].is_disjoint(&swept[1]));
        assert!(!swept[1].contains(&at(2, 5)));
        for (sweep, cells) in swept.iter().zip(&bag_cells) {
            assert!(sweep.is_subset(cells));
        }
        assert_eq!(state.prop(across).unwrap().location.origin, at(4, 5));
    }

    #[test]
    fn test_blocked_route_is_dropped() {
        let (mut state, solar) = galaxy();
        let first = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let second = state.spawn_ship(solar, 1, "scout", at(0, 2)).unwrap();
        let actions = [
            Action::new(1, MoveShip { ship: first, destination: at(2, 0) }, &state).unwrap(),
            Action::new(1, MoveShip { ship: second, destination: at(2, 0) }, &state).unwrap(),
        ];
        let bags = bag_moves(plan_moves(&state, &actions));
        assert_eq!(bags.len(), 1);
        let mut playback = MovePlayback::new(bags);

        playback.run_to_completion(&mut state).unwrap();
        assert_eq!(playback.take_applied().len(), 1);
        assert_eq!(state.prop(second).unwrap().location.origin, at(0, 2));
    }

    #[test]
    fn test_dropped_moves_skip_ahead() {
        let (mut state, solar) = galaxy();
        let a = state.spawn_ship(solar, 1, "scout", at(0, 0)).unwrap();
        let b = state.spawn_ship(solar, 1, "scout", at(6, 0)).unwrap();
        let mut playback = playback(&mut state, &[(a, (3, 0)), (b, (3, 0))]);

        playback.run_to_completion(&mut state).unwrap();
        let applied = playback.take_applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].0, 0);
        assert_eq!(state.prop(b).unwrap().location.origin, at(6, 0));
    }
}
