//! Grid geometry shared by every spatial query.
//!
//! - [`Point`]: a single integer cell
//! - [`Dimension`]: a width/height pair, never smaller than 1x1
//! - [`GridLocation`]: the axis-aligned box a prop occupies

mod location;
mod point;

pub use location::GridLocation;
pub use point::{Dimension, Point};
