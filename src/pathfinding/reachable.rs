//! Speed-bounded reachable sets.

use std::collections::{BTreeSet, HashSet};

use crate::error::IllegalActionError;
use crate::geometry::{GridLocation, Point};
use crate::pathfinding::ShipContext;
use crate::state::{GameState, PropId, SolarSystem};

/// Every origin a prop at `from` can move to in at most `speed` steps.
///
/// Breadth-first, one level per unit of speed. A cell is accepted when the
/// prop's whole footprint fits there without overlapping anything but
/// `ignore`. Rejected cells are not expanded further; the search still
/// reaches around them through the other frontier cells. The starting
/// origin is never part of the result.
#[must_use]
pub fn reachable_set(
    solar: &SolarSystem,
    from: GridLocation,
    speed: u32,
    ignore: Option<PropId>,
) -> BTreeSet<Point> {
    let mut reachable = BTreeSet::new();
    let mut visited = HashSet::from([from.origin]);
    let mut frontier = vec![from.origin];

    for _ in 0..speed {
        let mut next = Vec::new();
        for point in frontier {
            for neighbour in point.neighbours() {
                if !visited.insert(neighbour) {
                    continue;
                }
                if solar.is_free_for(&from.moved_to(neighbour), ignore) {
                    reachable.insert(neighbour);
                    next.push(neighbour);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    reachable
}

/// The reachable set of a ship on a grid, using its own speed and
/// footprint.
///
/// # Errors
///
/// Returns an error if `ship` does not resolve to a ship on a grid.
pub fn ship_reachable_set(
    state: &GameState,
    ship: PropId,
) -> Result<BTreeSet<Point>, IllegalActionError> {
    let context = ShipContext::resolve(state, ship)?;
    Ok(reachable_set(
        context.solar,
        context.prop.location,
        context.data.speed,
        Some(ship),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dimension;
    use crate::state::{Prop, PropKind, SolarId, Star};

    fn empty(size: i32) -> SolarSystem {
        SolarSystem::new(SolarId(1), "Test", Dimension::new(size, size).unwrap())
    }

    fn with_wall(size: i32, cells: &[(i32, i32)]) -> SolarSystem {
        let mut solar = empty(size);
        for (i, &(x, y)) in cells.iter().enumerate() {
            let id = PropId(100 + u32::try_from(i).unwrap());
            let kind = PropKind::Star(Star {
                star_type: "white_dwarf".to_owned(),
            });
            solar
                .add_prop(Prop::new(id, None, GridLocation::unit(x, y), kind))
                .unwrap();
        }
        solar
    }

    #[test]
    fn test_levels_are_manhattan_diamonds() {
        let solar = empty(10);
        let set = reachable_set(&solar, GridLocation::unit(5, 5), 2, None);
        // 4 at distance 1, 8 at distance 2
        assert_eq!(set.len(), 12);
        assert!(set.iter().all(|p| {
            let d = p.manhattan_distance(Point::new(5, 5));
            (1..=2).contains(&d)
        }));
        assert!(!set.contains(&Point::new(5, 5)));
    }

    #[test]
    fn test_zero_speed_is_empty() {
        let solar = empty(5);
        assert!(reachable_set(&solar, GridLocation::unit(2, 2), 0, None).is_empty());
    }

    #[test]
    fn test_blocked_cells_excluded_and_routed_around() {
        // Wall at x = 1 except at y = 3
        let solar = with_wall(6, &[(1, 0), (1, 1), (1, 2)]);
        let set = reachable_set(&solar, GridLocation::unit(0, 0), 8, None);
        assert!(!set.contains(&Point::new(1, 0)));
        // Only reachable by going down to y = 3 and back up: 8 steps
        assert!(set.contains(&Point::new(2, 0)));
        assert!(!reachable_set(&solar, GridLocation::unit(0, 0), 7, None)
            .contains(&Point::new(2, 0)));
    }

    #[test]
    fn test_large_footprint_respects_bounds() {
        let solar = empty(4);
        let from = GridLocation::new(Point::new(0, 0), Dimension::new(2, 2).unwrap());
        let set = reachable_set(&solar, from, 5, None);
        assert!(set.iter().all(|p| p.x <= 2 && p.y <= 2 && p.x >= 0 && p.y >= 0));
        assert_eq!(set.len(), 8);
    }

    #[test]
    fn test_ignore_own_footprint() {
        let mut solar = empty(5);
        let ship = Prop::new(
            PropId(1),
            Some(1),
            GridLocation::new(Point::new(1, 1), Dimension::new(2, 2).unwrap()),
            PropKind::Star(Star {
                star_type: "white_dwarf".to_owned(),
            }),
        );
        solar.add_prop(ship.clone()).unwrap();
        assert!(reachable_set(&solar, ship.location, 1, None).is_empty());
        assert_eq!(reachable_set(&solar, ship.location, 1, Some(PropId(1))).len(), 4);
    }
}
