//! Grouping moves into collision-safe bags.
//!
//! Two moves whose swept cells intersect must never be in flight at the
//! same time, so they share a bag and run one after the other. Moves that
//! cannot touch end up in different bags and run side by side.
//!
//! Grouping happens in two passes:
//! 1. [`assign_greedy`]: each move joins the first bag in its solar system
//!    whose cells it intersects, or opens a new bag.
//! 2. [`merge_to_fixpoint`]: bags whose cells intersect are merged until
//!    no pair does. The greedy pass alone misses chains where a later move
//!    bridges two earlier bags.

use std::collections::{BTreeSet, VecDeque};

use crate::action::Action;
use crate::geometry::Point;
use crate::pathfinding::{RoutePlan, ShipPath};
use crate::state::SolarId;

/// A move ready for bagging: its position in the submitted turn, the
/// action, the route committed for it and the cells it sweeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    index: usize,
    solar: SolarId,
    action: Action,
    path: ShipPath,
    plan: Option<RoutePlan>,
}

impl PlannedMove {
    /// Bundle a move with its sweep.
    #[must_use]
    pub const fn new(index: usize, solar: SolarId, action: Action, path: ShipPath) -> Self {
        Self {
            index,
            solar,
            action,
            path,
            plan: None,
        }
    }

    /// Commit the route the move follows during playback. Its cells must
    /// lie within the sweep.
    #[must_use]
    pub fn with_plan(mut self, plan: RoutePlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Position in the submitted turn.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Solar system the move happens in.
    #[must_use]
    pub const fn solar(&self) -> SolarId {
        self.solar
    }

    /// The `MoveShip` action.
    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }

    /// Swept cells.
    #[must_use]
    pub const fn path(&self) -> &ShipPath {
        &self.path
    }

    /// The committed route, if a route existed when the move was planned.
    #[must_use]
    pub const fn plan(&self) -> Option<&RoutePlan> {
        self.plan.as_ref()
    }
}

/// Moves that may collide, run strictly in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagOfMoves {
    solar: SolarId,
    cells: BTreeSet<Point>,
    moves: VecDeque<PlannedMove>,
}

impl BagOfMoves {
    fn open(planned: PlannedMove) -> Self {
        Self {
            solar: planned.solar,
            cells: planned.path.cells().clone(),
            moves: VecDeque::from([planned]),
        }
    }

    /// Solar system of every move in the bag.
    #[must_use]
    pub const fn solar(&self) -> SolarId {
        self.solar
    }

    /// Union of all swept cells.
    #[must_use]
    pub const fn cells(&self) -> &BTreeSet<Point> {
        &self.cells
    }

    /// Remaining moves, in execution order.
    pub fn moves(&self) -> impl Iterator<Item = &PlannedMove> {
        self.moves.iter()
    }

    /// Number of remaining moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether every move has been popped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Whether `planned` could collide with a move in this bag.
    #[must_use]
    pub fn accepts(&self, planned: &PlannedMove) -> bool {
        self.solar == planned.solar && planned.path.intersects(&self.cells)
    }

    /// Whether the two bags could collide.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.solar == other.solar && !self.cells.is_disjoint(&other.cells)
    }

    fn push(&mut self, planned: PlannedMove) {
        self.cells.extend(planned.path.cells().iter().copied());
        self.moves.push_back(planned);
    }

    /// Take over `other`'s moves and cells. Moves keep submission order.
    fn merge(&mut self, other: Self) {
        self.cells.extend(other.cells);
        self.moves.extend(other.moves);
        self.moves.make_contiguous().sort_by_key(PlannedMove::index);
    }

    pub(crate) fn pop_front(&mut self) -> Option<PlannedMove> {
        self.moves.pop_front()
    }
}

/// First pass: put each move into the first bag it could collide with.
#[must_use]
pub fn assign_greedy(moves: impl IntoIterator<Item = PlannedMove>) -> Vec<BagOfMoves> {
    let mut bags: Vec<BagOfMoves> = Vec::new();
    for planned in moves {
        match bags.iter_mut().find(|bag| bag.accepts(&planned)) {
            Some(bag) => bag.push(planned),
            None => bags.push(BagOfMoves::open(planned)),
        }
    }
    bags
}

/// Second pass: merge overlapping bags until no two overlap.
#[must_use]
pub fn merge_to_fixpoint(mut bags: Vec<BagOfMoves>) -> Vec<BagOfMoves> {
    loop {
        let pair = (0..bags.len()).find_map(|i| {
            (i + 1..bags.len())
                .find(|&j| bags[i].overlaps(&bags[j]))
                .map(|j| (i, j))
        });
        let Some((keep, absorbed)) = pair else {
            return bags;
        };
        let other = bags.remove(absorbed);
        bags[keep].merge(other);
    }
}

/// Both passes.
#[must_use]
pub fn bag_moves(moves: impl IntoIterator<Item = PlannedMove>) -> Vec<BagOfMoves> {
    merge_to_fixpoint(assign_greedy(moves))
}
