//! The closed set of interpolation methods a warp may use.

use std::fmt;
use std::str::FromStr;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BSplineInterpolator, Interpolator, LinearInterpolator, NearestNeighborInterpolator};

/// Interpolation used when resampling a source onto the destination grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    #[default]
    NearestNeighbor,
    Linear,
    Spline,
}

/// A method name outside [`Interpolation`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported interpolation `{0}` (expected one of: nn, linear, spline)")]
pub struct UnknownInterpolation(pub String);

impl Interpolation {
    pub const ALL: [Interpolation; 3] = [Self::NearestNeighbor, Self::Linear, Self::Spline];

    /// Short name, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearestNeighbor => "nn",
            Self::Linear => "linear",
            Self::Spline => "spline",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = UnknownInterpolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nn" | "nearest" | "nearest-neighbor" | "nearest_neighbor" => Ok(Self::NearestNeighbor),
            "linear" | "trilinear" => Ok(Self::Linear),
            "spline" | "bspline" | "cubic" => Ok(Self::Spline),
            _ => Err(UnknownInterpolation(s.to_string())),
        }
    }
}

impl<B: Backend> Interpolator<B> for Interpolation {
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            Self::NearestNeighbor => NearestNeighborInterpolator.interpolate(data, indices),
            Self::Linear => LinearInterpolator.interpolate(data, indices),
            Self::Spline => BSplineInterpolator.interpolate(data, indices),
        }
    }
}
