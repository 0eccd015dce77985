//! Index/physical coordinate mapping for a voxel grid.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use serde::{Deserialize, Serialize};

use crate::spatial::{Direction, Point, Spacing, Vector};

/// Placement of a voxel grid in physical space.
///
/// `point = origin + direction * (index * spacing)` and its inverse
/// `index = (direction^-1 * (point - origin)) / spacing`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeGeometry<const D: usize> {
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
}

impl<const D: usize> VolumeGeometry<D> {
    pub fn new(origin: Point<D>, spacing: Spacing<D>, direction: Direction<D>) -> Self {
        Self {
            origin,
            spacing,
            direction,
        }
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    fn inverse_direction(&self) -> Direction<D> {
        self.direction
            .try_inverse()
            .expect("direction matrix must be invertible")
    }

    /// Map a physical point to a continuous voxel index.
    pub fn physical_to_continuous_index(&self, point: &Point<D>) -> Point<D> {
        let rotated = self.inverse_direction() * (*point - self.origin);
        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// Map a continuous voxel index to a physical point.
    pub fn continuous_index_to_physical(&self, index: &Point<D>) -> Point<D> {
        let mut scaled = Vector::<D>::zeros();
        for i in 0..D {
            scaled[i] = index[i] * self.spacing[i];
        }
        self.origin + self.direction * scaled
    }

    /// Batched physical → index mapping.
    ///
    /// `points` is `[N, D]`; the result is `[N, D]` continuous indices.
    /// Computed as `(P - O) @ T` with `T[r, c] = inv(Dir)[c, r] / S[c]`.
    pub fn world_to_index_tensor<B: Backend>(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();
        let inv_dir = self.inverse_direction();

        let mut t_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t_tensor =
            Tensor::<B, 2>::from_data(TensorData::new(t_data, Shape::new([D, D])), &device);

        (points - self.origin_row::<B>(&device)).matmul(t_tensor)
    }

    /// Batched index → physical mapping, `O + I @ M` with
    /// `M[r, c] = S[r] * Dir[c, r]`.
    pub fn index_to_world_tensor<B: Backend>(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();

        let mut m_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m_data.push((self.spacing[r] * self.direction[(c, r)]) as f32);
            }
        }
        let m_tensor =
            Tensor::<B, 2>::from_data(TensorData::new(m_data, Shape::new([D, D])), &device);

        indices.matmul(m_tensor) + self.origin_row::<B>(&device)
    }

    fn origin_row<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let origin: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        Tensor::<B, 1>::from_data(TensorData::new(origin, Shape::new([D])), device).reshape([1, D])
    }

    /// Component-wise comparison of origin, spacing and direction.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance;
        (0..D).all(|i| {
            close(self.origin[i], other.origin[i])
                && close(self.spacing[i], other.spacing[i])
                && (0..D).all(|j| close(self.direction[(i, j)], other.direction[(i, j)]))
        })
    }
}

impl<const D: usize> Default for VolumeGeometry<D> {
    /// Zero origin, unit spacing, identity orientation.
    fn default() -> Self {
        Self::new(Point::origin(), Spacing::uniform(1.0), Direction::identity())
    }
}
