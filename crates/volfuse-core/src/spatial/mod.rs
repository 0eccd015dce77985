//! Physical-space primitives: points, vectors, spacing and direction cosines.
//!
//! All types wrap nalgebra statics so arithmetic stays on the stack.

pub mod point;
pub mod vector;
pub mod direction;

pub use point::Point;
pub use vector::{Spacing, Vector};
pub use direction::Direction;

pub type Point3 = Point<3>;
pub type Vector3 = Vector<3>;
pub type Spacing3 = Spacing<3>;
pub type Direction3 = Direction<3>;
