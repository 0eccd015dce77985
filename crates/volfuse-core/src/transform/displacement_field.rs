//! Dense displacement field transform.
//!
//! The field stores one physical displacement vector per voxel of its own
//! grid. A point `p` maps to `p + u(p)`, with `u` sampled trilinearly.
//! Points beyond the field's grid take the nearest border displacement.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use thiserror::Error;

use super::trait_::Transform;
use crate::interpolation::{Interpolator, LinearInterpolator};
use crate::volume::VolumeGeometry;

/// A component tensor whose leading axis is not 3.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("displacement field needs 3 components, found {0}")]
pub struct ComponentCountError(pub usize);

/// Dense 3-D displacement field.
///
/// `components` has shape `[3, Z, Y, X]`; component `c` is the displacement
/// along physical axis `c` (x, y, z) of the geometry's world frame, in the
/// same units. That frame is the NIfTI (RAS) world; readers convert vectors
/// stored in other frames.
#[derive(Debug, Clone)]
pub struct DisplacementField<B: Backend> {
    components: Tensor<B, 4>,
    geometry: VolumeGeometry<3>,
}

impl<B: Backend> DisplacementField<B> {
    /// Wrap a `[3, Z, Y, X]` tensor.
    pub fn new(components: Tensor<B, 4>, geometry: VolumeGeometry<3>) -> Result<Self, ComponentCountError> {
        let count = components.dims()[0];
        if count != 3 {
            return Err(ComponentCountError(count));
        }
        Ok(Self {
            components,
            geometry,
        })
    }

    /// The identity warp on a `[Z, Y, X]` grid.
    pub fn zeros(shape: [usize; 3], geometry: VolumeGeometry<3>, device: &B::Device) -> Self {
        let [z, y, x] = shape;
        Self {
            components: Tensor::zeros([3, z, y, x], device),
            geometry,
        }
    }

    /// The same displacement everywhere on the grid.
    pub fn uniform(
        shape: [usize; 3],
        displacement: [f32; 3],
        geometry: VolumeGeometry<3>,
        device: &B::Device,
    ) -> Self {
        let [z, y, x] = shape;
        let components: Vec<Tensor<B, 3>> = displacement
            .iter()
            .map(|&d| Tensor::<B, 3>::full([z, y, x], d, device))
            .collect();
        Self {
            components: Tensor::stack(components, 0),
            geometry,
        }
    }

    pub fn components(&self) -> &Tensor<B, 4> {
        &self.components
    }

    pub fn geometry(&self) -> &VolumeGeometry<3> {
        &self.geometry
    }

    /// Spatial shape `[Z, Y, X]` of the field grid.
    pub fn shape(&self) -> [usize; 3] {
        let [_, z, y, x] = self.components.dims();
        [z, y, x]
    }

    fn component(&self, axis: usize) -> Tensor<B, 3> {
        let [z, y, x] = self.shape();
        self.components
            .clone()
            .slice([axis..axis + 1, 0..z, 0..y, 0..x])
            .reshape([z, y, x])
    }

    /// Displacements at `points` (`[N, 3]` physical), as `[N, 3]`.
    pub fn displacement_at(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let indices = self.geometry.world_to_index_tensor(points);
        let sampled: Vec<Tensor<B, 1>> = (0..3)
            .map(|axis| LinearInterpolator.interpolate(&self.component(axis), indices.clone()))
            .collect();
        Tensor::stack(sampled, 1)
    }
}

impl<B: Backend> Transform<B, 3> for DisplacementField<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let displacement = self.displacement_at(points.clone());
        points + displacement
    }
}
