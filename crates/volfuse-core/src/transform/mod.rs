//! Spatial transforms.
//!
//! A warp resamples the destination grid, so transforms here map
//! destination (output) physical points to source (input) physical points.

pub mod trait_;
pub mod displacement_field;

pub use trait_::Transform;
pub use displacement_field::{ComponentCountError, DisplacementField};
