//! Displacements and per-axis spacing.

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// A displacement or per-axis quantity in D dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector<const D: usize>(pub SVector<f64, D>);

/// Physical distance between neighbouring voxels along each axis.
pub type Spacing<const D: usize> = Vector<D>;

impl<const D: usize> Vector<D> {
    pub fn new(components: [f64; D]) -> Self {
        Self(SVector::from(components))
    }

    pub fn zeros() -> Self {
        Self(SVector::zeros())
    }

    /// Same value on every axis.
    pub fn uniform(value: f64) -> Self {
        Self(SVector::repeat(value))
    }

    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    /// True when every component is finite and strictly positive, which is
    /// what a usable voxel spacing must satisfy.
    pub fn is_valid_spacing(&self) -> bool {
        self.0.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

impl<const D: usize> std::ops::Index<usize> for Vector<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Vector<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Add for Vector<D> {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl<const D: usize> std::ops::Sub for Vector<D> {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl<const D: usize> std::ops::Mul<f64> for Vector<D> {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}
