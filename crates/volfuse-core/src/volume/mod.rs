//! Volumes with physical metadata.
//!
//! A [`Volume`] couples a dense tensor (storage order `[Z, Y, X]`) with the
//! [`VolumeGeometry`] that maps voxel indices `(x, y, z)` to physical points.
//! A [`VolumeStack`] is N equally shaped volumes sharing one geometry.

pub mod geometry;
pub mod grid;
pub mod stack;
#[allow(clippy::module_inception)]
pub mod volume;

pub use geometry::VolumeGeometry;
pub use grid::generate_grid;
pub use stack::{StackError, VolumeStack};
pub use volume::Volume;
