//! Axis-aligned boxes on the grid.

use serde::{Deserialize, Serialize};

use super::{Dimension, Point};

/// The box a prop occupies: an origin (top-left cell) plus a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridLocation {
    /// Top-left cell.
    pub origin: Point,
    /// Extent from the origin.
    pub dimension: Dimension,
}

impl GridLocation {
    /// Create a location.
    #[must_use]
    pub const fn new(origin: Point, dimension: Dimension) -> Self {
        Self { origin, dimension }
    }

    /// A single-cell location at `(x, y)`.
    #[must_use]
    pub const fn unit(x: i32, y: i32) -> Self {
        Self::new(Point::new(x, y), Dimension::UNIT)
    }

    /// One past the right-most column.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.origin.x + self.dimension.width()
    }

    /// One past the bottom-most row.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.origin.y + self.dimension.height()
    }

    /// Whether `point` is one of the covered cells.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x < self.right()
            && point.y >= self.origin.y
            && point.y < self.bottom()
    }

    /// Whether the two boxes share at least one cell.
    #[must_use]
    pub const fn collides(&self, other: &Self) -> bool {
        self.origin.x < other.right()
            && other.origin.x < self.right()
            && self.origin.y < other.bottom()
            && other.origin.y < self.bottom()
    }

    /// Whether the two boxes touch along an edge or corner without overlapping.
    #[must_use]
    pub const fn is_adjacent(&self, other: &Self) -> bool {
        !self.collides(other)
            && self.origin.x <= other.right()
            && other.origin.x <= self.right()
            && self.origin.y <= other.bottom()
            && other.origin.y <= self.bottom()
    }

    /// Return this location shifted by `(dx, dy)`.
    #[must_use]
    pub const fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.origin.translate(dx, dy), self.dimension)
    }

    /// Same dimension, new origin.
    #[must_use]
    pub const fn moved_to(&self, origin: Point) -> Self {
        Self::new(origin, self.dimension)
    }

    /// Whether the whole box lies inside a grid of size `bounds`.
    #[must_use]
    pub const fn fits_within(&self, bounds: Dimension) -> bool {
        self.origin.x >= 0
            && self.origin.y >= 0
            && self.right() <= bounds.width()
            && self.bottom() <= bounds.height()
    }

    /// Every covered cell, row by row.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let origin = self.origin;
        let (width, height) = (self.dimension.width(), self.dimension.height());
        (0..height).flat_map(move |dy| (0..width).map(move |dx| origin.translate(dx, dy)))
    }

    /// Squared Euclidean distance between the two box centres, measured in
    /// half-cells so it stays integral.
    #[must_use]
    pub fn doubled_distance_squared(&self, other: &Self) -> i64 {
        let (ax, ay) = self.doubled_centre();
        let (bx, by) = other.doubled_centre();
        (ax - bx).pow(2) + (ay - by).pow(2)
    }

    /// Euclidean distance between the two box centres, in cells.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let doubled = self.doubled_distance_squared(other) as f64;
        doubled.sqrt() / 2.0
    }

    /// Whether the centres are at most `range` cells apart.
    #[must_use]
    pub fn within_range(&self, other: &Self, range: u32) -> bool {
        let doubled_range = 2 * i64::from(range);
        self.doubled_distance_squared(other) <= doubled_range * doubled_range
    }

    /// The candidate whose centre is nearest to this location's centre.
    ///
    /// Ties are broken by the smaller origin, so the result does not depend
    /// on candidate order.
    pub fn closest<I>(&self, candidates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        candidates
            .into_iter()
            .min_by_key(|candidate| (self.doubled_distance_squared(candidate), candidate.origin))
    }

    fn doubled_centre(&self) -> (i64, i64) {
        (
            2 * i64::from(self.origin.x) + i64::from(self.dimension.width()),
            2 * i64::from(self.origin.y) + i64::from(self.dimension.height()),
        )
    }
}

impl std::fmt::Display for GridLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}+{}x{}",
            self.origin,
            self.dimension.width(),
            self.dimension.height()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: i32, y: i32, w: i32, h: i32) -> GridLocation {
        GridLocation::new(Point::new(x, y), Dimension::new(w, h).unwrap())
    }

    #[test]
    fn test_contains() {
        let loc = boxed(2, 2, 2, 3);
        assert!(loc.contains(Point::new(3, 4)));
        assert!(!loc.contains(Point::new(4, 4)));
        assert!(!loc.contains(Point::new(2, 5)));
    }

    #[test]
    fn test_collides_overlap_and_edges() {
        let a = boxed(0, 0, 2, 2);
        assert!(a.collides(&boxed(1, 1, 2, 2)));
        assert!(!a.collides(&boxed(2, 0, 1, 1)));
        assert!(!a.collides(&boxed(0, 2, 3, 1)));
        assert!(a.collides(&a));
    }

    #[test]
    fn test_adjacent_includes_corners() {
        let a = boxed(1, 1, 2, 2);
        assert!(a.is_adjacent(&GridLocation::unit(3, 1)));
        assert!(a.is_adjacent(&GridLocation::unit(0, 0)));
        assert!(!a.is_adjacent(&GridLocation::unit(4, 1)));
        assert!(!a.is_adjacent(&GridLocation::unit(2, 2)));
    }

    #[test]
    fn test_fits_within() {
        let bounds = Dimension::new(10, 10).unwrap();
        assert!(boxed(8, 8, 2, 2).fits_within(bounds));
        assert!(!boxed(9, 8, 2, 2).fits_within(bounds));
        assert!(!boxed(-1, 0, 1, 1).fits_within(bounds));
    }

    #[test]
    fn test_points_cover_box() {
        let points: Vec<_> = boxed(1, 2, 2, 2).points().collect();
        assert_eq!(
            points,
            vec![
                Point::new(1, 2),
                Point::new(2, 2),
                Point::new(1, 3),
                Point::new(2, 3)
            ]
        );
    }

    #[test]
    fn test_closest_breaks_ties_by_origin() {
        let here = GridLocation::unit(5, 5);
        let candidates = [
            GridLocation::unit(6, 5),
            GridLocation::unit(4, 5),
            GridLocation::unit(5, 8),
        ];
        assert_eq!(here.closest(candidates), Some(GridLocation::unit(4, 5)));
        assert_eq!(here.closest(Vec::new()), None);
    }

    #[test]
    fn test_range_uses_centres() {
        let big = boxed(0, 0, 3, 3);
        let small = GridLocation::unit(4, 1);
        assert!((big.distance(&small) - 3.0).abs() < f64::EPSILON);
        assert!(big.within_range(&small, 3));
        assert!(!big.within_range(&small, 2));
    }
}
