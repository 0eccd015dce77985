//! Sampling of 3-D volumes at continuous indices.
//!
//! Every interpolator reads data stored `[Z, Y, X]` and takes indices as
//! `[N, 3]` rows of `(x, y, z)`.

pub mod trait_;
pub mod mode;
pub mod nearest;
pub mod linear;
pub mod bspline;

pub use trait_::Interpolator;
pub use mode::{Interpolation, UnknownInterpolation};
pub use nearest::NearestNeighborInterpolator;
pub use linear::LinearInterpolator;
pub use bspline::BSplineInterpolator;
