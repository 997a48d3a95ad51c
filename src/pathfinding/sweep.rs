//! Cells swept by a route.

use std::collections::BTreeSet;

use crate::geometry::{GridLocation, Point};
use crate::state::PropId;

/// The cells a ship's footprint passes over while following a route,
/// start and end included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipPath {
    ship: PropId,
    cells: BTreeSet<Point>,
}

impl ShipPath {
    /// Sweep `route` for `ship`.
    #[must_use]
    pub fn from_route(ship: PropId, route: &[GridLocation]) -> Self {
        let cells = route.iter().flat_map(GridLocation::points).collect();
        Self { ship, cells }
    }

    /// The moving ship.
    #[must_use]
    pub const fn ship(&self) -> PropId {
        self.ship
    }

    /// Swept cells.
    #[must_use]
    pub const fn cells(&self) -> &BTreeSet<Point> {
        &self.cells
    }

    /// Whether any swept cell is in `cells`.
    #[must_use]
    pub fn intersects(&self, cells: &BTreeSet<Point>) -> bool {
        let (small, large) = if self.cells.len() <= cells.len() {
            (&self.cells, cells)
        } else {
            (cells, &self.cells)
        };
        small.iter().any(|cell| large.contains(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dimension;

    #[test]
    fn test_sweep_covers_footprint_along_route() {
        let dim = Dimension::new(2, 2).unwrap();
        let route = [
            GridLocation::new(Point::new(0, 0), dim),
            GridLocation::new(Point::new(1, 0), dim),
        ];
        let path = ShipPath::from_route(PropId(1), &route);
        assert_eq!(path.cells().len(), 6);
        assert!(path.cells().contains(&Point::new(2, 1)));
    }

    #[test]
    fn test_crossing_paths_intersect() {
        let across: Vec<_> = (0..5).map(|x| GridLocation::unit(x, 2)).collect();
        let down: Vec<_> = (0..5).map(|y| GridLocation::unit(2, y)).collect();
        let apart: Vec<_> = (0..5).map(|x| GridLocation::unit(x, 4)).collect();
        let a = ShipPath::from_route(PropId(1), &across);
        let b = ShipPath::from_route(PropId(2), &down);
        let c = ShipPath::from_route(PropId(3), &apart);
        assert!(a.intersects(b.cells()));
        assert!(!a.intersects(c.cells()));
        assert!(b.intersects(c.cells()));
    }
}
