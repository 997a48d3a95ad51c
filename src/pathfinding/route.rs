//! Concrete shortest routes.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::geometry::{GridLocation, Point};
use crate::pathfinding::reachable_set;
use crate::state::{PropId, SolarSystem};

/// Shortest 4-connected route for a footprint from `from` to `destination`.
///
/// A* with a Manhattan heuristic; only free locations (ignoring `ignore`)
/// are expanded. The route starts with `from` and ends at the destination.
/// Returns `None` if the destination is blocked or unreachable.
#[must_use]
pub fn find_route(
    solar: &SolarSystem,
    from: GridLocation,
    destination: Point,
    ignore: Option<PropId>,
) -> Option<Vec<GridLocation>> {
    if destination == from.origin {
        return Some(vec![from]);
    }
    if !solar.is_free_for(&from.moved_to(destination), ignore) {
        return None;
    }

    let heuristic = |p: Point| p.manhattan_distance(destination);
    let start = heuristic(from.origin);
    let mut open = BinaryHeap::from([Reverse((start, start, from.origin))]);
    let mut cost: HashMap<Point, u32> = HashMap::from([(from.origin, 0)]);
    let mut came_from: HashMap<Point, Point> = HashMap::new();
    let mut closed: HashSet<Point> = HashSet::new();

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == destination {
            return Some(reconstruct(&came_from, from, destination));
        }
        if !closed.insert(current) {
            continue;
        }
        let g = cost.get(&current).copied().unwrap_or(u32::MAX);
        for neighbour in current.neighbours() {
            if closed.contains(&neighbour)
                || !solar.is_free_for(&from.moved_to(neighbour), ignore)
            {
                continue;
            }
            let tentative = g + 1;
            if tentative < cost.get(&neighbour).copied().unwrap_or(u32::MAX) {
                cost.insert(neighbour, tentative);
                came_from.insert(neighbour, current);
                let h = heuristic(neighbour);
                open.push(Reverse((tentative + h, h, neighbour)));
            }
        }
    }

    None
}

fn reconstruct(
    came_from: &HashMap<Point, Point>,
    from: GridLocation,
    destination: Point,
) -> Vec<GridLocation> {
    let mut points = vec![destination];
    let mut current = destination;
    while let Some(&previous) = came_from.get(&current) {
        points.push(previous);
        current = previous;
    }
    points.reverse();
    points.into_iter().map(|p| from.moved_to(p)).collect()
}

/// A route chosen for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    /// Locations visited, starting with the current one.
    pub route: Vec<GridLocation>,
    /// Whether the requested destination was unreachable and the closest
    /// reachable point was used instead.
    pub fallback: bool,
}

impl RoutePlan {
    /// Where the route ends.
    #[must_use]
    pub fn end(&self) -> Option<GridLocation> {
        self.route.last().copied()
    }

    /// Number of steps taken.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.route.len().saturating_sub(1)
    }
}

/// A route of at most `speed` steps towards `destination`.
///
/// If no such route exists, falls back once to the reachable point whose
/// location is closest to the requested one. Returns `None` when even the
/// fallback fails, in which case the prop stays put.
#[must_use]
pub fn plan_route(
    solar: &SolarSystem,
    from: GridLocation,
    destination: Point,
    speed: u32,
    ignore: Option<PropId>,
) -> Option<RoutePlan> {
    let within_speed = |route: &Vec<GridLocation>| route.len() <= speed as usize + 1;
    if let Some(route) = find_route(solar, from, destination, ignore).filter(within_speed) {
        return Some(RoutePlan {
            route,
            fallback: false,
        });
    }

    let target = from.moved_to(destination);
    let candidates = reachable_set(solar, from, speed, ignore);
    let closest = target.closest(candidates.into_iter().map(|p| from.moved_to(p)))?;
    let route = find_route(solar, from, closest.origin, ignore).filter(within_speed)?;
    tracing::warn!(
        from = %from.origin,
        requested = %destination,
        reached = %closest.origin,
        "route blocked, falling back to closest reachable point"
    );
    Some(RoutePlan {
        route,
        fallback: true,
    })
}
