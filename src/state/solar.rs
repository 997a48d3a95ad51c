//! Solar systems: bounded grids of props.
//!
//! No two props in one solar system ever overlap. Every mutator checks
//! bounds and occupancy before touching the prop set.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::PlacementError;
use crate::geometry::{Dimension, GridLocation, Point};
use crate::state::{Prop, PropId};

/// Solar system identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolarId(pub u32);

impl std::fmt::Display for SolarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A bounded grid holding props.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarSystem {
    id: SolarId,
    name: String,
    dimension: Dimension,
    props: BTreeMap<PropId, Prop>,
}

impl SolarSystem {
    /// An empty solar system.
    #[must_use]
    pub fn new(id: SolarId, name: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            id,
            name: name.into(),
            dimension,
            props: BTreeMap::new(),
        }
    }

    /// Solar system ID.
    #[must_use]
    pub const fn id(&self) -> SolarId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid size.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Props in ID order.
    pub fn props(&self) -> impl Iterator<Item = &Prop> {
        self.props.values()
    }

    /// Look up a prop by ID.
    #[must_use]
    pub fn prop(&self, id: PropId) -> Option<&Prop> {
        self.props.get(&id)
    }

    pub(crate) fn prop_mut(&mut self, id: PropId) -> Option<&mut Prop> {
        self.props.get_mut(&id)
    }

    /// Whether `location` lies entirely on the grid.
    #[must_use]
    pub const fn fits(&self, location: &GridLocation) -> bool {
        location.fits_within(self.dimension)
    }

    /// First prop (in ID order) overlapping `location`, skipping `ignore`.
    #[must_use]
    pub fn occupant(&self, location: &GridLocation, ignore: Option<PropId>) -> Option<PropId> {
        self.props
            .values()
            .find(|prop| Some(prop.id) != ignore && prop.location.collides(location))
            .map(|prop| prop.id)
    }

    /// Whether any prop overlaps `location`.
    #[must_use]
    pub fn is_occupied(&self, location: &GridLocation) -> bool {
        self.occupant(location, None).is_some()
    }

    /// Whether `location` fits and overlaps nothing other than `ignore`.
    #[must_use]
    pub fn is_free_for(&self, location: &GridLocation, ignore: Option<PropId>) -> bool {
        self.fits(location) && self.occupant(location, ignore).is_none()
    }

    /// The prop covering `point`, if any.
    #[must_use]
    pub fn prop_at(&self, point: Point) -> Option<&Prop> {
        self.props
            .values()
            .find(|prop| prop.location.contains(point))
    }

    /// Free locations of size `dimension` touching `location`'s perimeter,
    /// corners included, in row-major order of their origins.
    #[must_use]
    pub fn neighbours(&self, location: &GridLocation, dimension: Dimension) -> Vec<GridLocation> {
        let xs = location.origin.x - dimension.width()..=location.right();
        let ys = location.origin.y - dimension.height()..=location.bottom();
        ys.flat_map(|y| xs.clone().map(move |x| GridLocation::new(Point::new(x, y), dimension)))
            .filter(|candidate| {
                candidate.is_adjacent(location) && self.is_free_for(candidate, None)
            })
            .collect()
    }

    /// Every free location of size `dimension`, in row-major order.
    #[must_use]
    pub fn free_locations(&self, dimension: Dimension) -> Vec<GridLocation> {
        let max_x = self.dimension.width() - dimension.width();
        let max_y = self.dimension.height() - dimension.height();
        (0..=max_y)
            .flat_map(|y| (0..=max_x).map(move |x| GridLocation::new(Point::new(x, y), dimension)))
            .filter(|candidate| !self.is_occupied(candidate))
            .collect()
    }

    /// A uniformly chosen free location of size `dimension`, or `None` if
    /// the grid is full.
    pub fn random_free_location<R: Rng + ?Sized>(
        &self,
        dimension: Dimension,
        rng: &mut R,
    ) -> Option<GridLocation> {
        self.free_locations(dimension).choose(rng).copied()
    }

    /// Check that `prop` could be placed at `location`.
    ///
    /// # Errors
    ///
    /// Returns the first reason the placement would fail.
    pub fn check_placement(
        &self,
        prop: PropId,
        location: &GridLocation,
    ) -> Result<(), PlacementError> {
        if !self.fits(location) {
            return Err(PlacementError::OutOfBounds {
                prop,
                location: *location,
                bounds: self.dimension,
            });
        }
        if let Some(occupant) = self.occupant(location, Some(prop)) {
            return Err(PlacementError::Occupied {
                prop,
                location: *location,
                occupant,
            });
        }
        Ok(())
    }

    pub(crate) fn add_prop(&mut self, prop: Prop) -> Result<(), PlacementError> {
        if self.props.contains_key(&prop.id) {
            return Err(PlacementError::DuplicateId(prop.id));
        }
        self.check_placement(prop.id, &prop.location)?;
        self.props.insert(prop.id, prop);
        Ok(())
    }

    pub(crate) fn remove_prop(&mut self, id: PropId) -> Option<Prop> {
        self.props.remove(&id)
    }

    pub(crate) fn relocate(&mut self, id: PropId, origin: Point) -> Result<(), PlacementError> {
        let current = self
            .props
            .get(&id)
            .ok_or(PlacementError::UnknownProp(id))?
            .location;
        let target = current.moved_to(origin);
        self.check_placement(id, &target)?;
        if let Some(prop) = self.props.get_mut(&id) {
            prop.location = target;
        }
        Ok(())
    }
}
