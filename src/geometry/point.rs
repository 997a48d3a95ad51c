//! Points and dimensions.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// A cell on a solar system grid.
///
/// Ordering is lexicographic on `(x, y)` and is what every deterministic
/// tie-break in the crate falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return this point shifted by `(dx, dy)`.
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Clamp both coordinates into `[min, max]` (inclusive).
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }

    /// Manhattan distance to `other`.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbours (up, down, left, right).
    ///
    /// No bounds checking; callers filter against their grid.
    #[must_use]
    pub const fn neighbours(self) -> [Self; 4] {
        [
            self.translate(0, -1),
            self.translate(0, 1),
            self.translate(-1, 0),
            self.translate(1, 0),
        ]
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a box on the grid. Both are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDimension")]
pub struct Dimension {
    width: i32,
    height: i32,
}

#[derive(Deserialize)]
struct RawDimension {
    width: i32,
    height: i32,
}

impl TryFrom<RawDimension> for Dimension {
    type Error = GeometryError;

    fn try_from(raw: RawDimension) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height)
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::UNIT
    }
}

impl Dimension {
    /// The identity dimension, a single cell.
    pub const UNIT: Self = Self {
        width: 1,
        height: 1,
    };

    /// Create a dimension.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NonPositiveDimension`] if either side is below 1.
    pub const fn new(width: i32, height: i32) -> Result<Self, GeometryError> {
        if width < 1 || height < 1 {
            return Err(GeometryError::NonPositiveDimension { width, height });
        }
        Ok(Self { width, height })
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(self) -> i32 {
        self.height
    }

    /// Number of cells covered.
    #[must_use]
    pub fn area(self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    /// Whether a point lies within `[0, width) x [0, height)`.
    #[must_use]
    pub const fn contains(self, point: Point) -> bool {
        point.x >= 0 && point.y >= 0 && point.x < self.width && point.y < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_translate_and_distance() {
        let p = Point::new(2, 3).translate(-4, 1);
        assert_eq!(p, Point::new(-2, 4));
        assert_eq!(p.manhattan_distance(Point::new(0, 0)), 6);
    }

    #[test]
    fn test_point_clamp() {
        let p = Point::new(-3, 12).clamp(Point::new(0, 0), Point::new(9, 9));
        assert_eq!(p, Point::new(0, 9));
    }

    #[test]
    fn test_dimension_rejects_zero() {
        assert!(Dimension::new(0, 3).is_err());
        assert!(Dimension::new(2, -1).is_err());
        assert_eq!(Dimension::new(1, 1).unwrap(), Dimension::UNIT);
    }

    #[test]
    fn test_dimension_deserialize_validates() {
        let ok: Dimension = serde_json::from_str(r#"{"width":2,"height":3}"#).unwrap();
        assert_eq!(ok.area(), 6);
        assert!(serde_json::from_str::<Dimension>(r#"{"width":0,"height":3}"#).is_err());
    }

    #[test]
    fn test_dimension_contains() {
        let d = Dimension::new(3, 2).unwrap();
        assert!(d.contains(Point::new(2, 1)));
        assert!(!d.contains(Point::new(3, 0)));
        assert!(!d.contains(Point::new(0, -1)));
    }
}
