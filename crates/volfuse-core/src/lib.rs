//! Core types for volume fusion: physical-space geometry, voxel volumes,
//! dense displacement fields, interpolation, and the resample and merge
//! filters built on top of them.

pub mod spatial;
pub mod volume;
pub mod transform;
pub mod interpolation;
pub mod filter;

pub use spatial::{Direction, Point, Spacing, Vector};
pub use volume::{Volume, VolumeGeometry, VolumeStack};
