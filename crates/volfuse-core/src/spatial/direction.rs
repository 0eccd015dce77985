//! Direction cosine matrices.

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use super::Vector;

/// Orientation of the voxel axes in physical space.
///
/// Column `i` is the unit direction of voxel axis `i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Orthonormal within `1e-6`, i.e. a rotation or a reflection.
    pub fn is_orthogonal(&self) -> bool {
        let product = self.0 * self.0.transpose();
        (0..D).all(|i| {
            (0..D).all(|j| {
                let expected = if i == j { 1.0 } else { 0.0 };
                (product[(i, j)] - expected).abs() < 1e-6
            })
        })
    }

    pub fn inner(&self) -> &SMatrix<f64, D, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Vector3};

    #[test]
    fn test_rotation_is_orthogonal_and_invertible() {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.3);
        let direction = Direction::<3>(rotation.into_inner());
        assert!(direction.is_orthogonal());

        let inverse = direction.try_inverse().unwrap();
        let v = Vector::<3>::new([1.0, 2.0, 3.0]);
        let back = inverse * (direction * v);
        for i in 0..3 {
            assert!((back[i] - v[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_scaled_matrix_is_not_orthogonal() {
        let mut m = SMatrix::<f64, 3, 3>::identity();
        m[(0, 0)] = 2.0;
        assert!(!Direction::<3>(m).is_orthogonal());
    }
}
