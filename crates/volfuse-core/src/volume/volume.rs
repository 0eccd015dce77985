//! Dense volume with physical metadata.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::geometry::VolumeGeometry;
use crate::spatial::{Direction, Point, Spacing};

/// Voxel data plus the geometry that places it in physical space.
///
/// # Coordinate conventions
/// * storage order of `data` is `[Z, Y, X]` for 3-D volumes
/// * continuous indices and physical points are written `(x, y, z)`
///
/// # Examples
/// ```rust
/// use volfuse_core::Volume;
/// use volfuse_core::spatial::{Direction3, Point3, Spacing3};
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let device = Default::default();
/// let data = Tensor::<Backend, 3>::zeros([4, 5, 6], &device);
/// let volume = Volume::new(
///     data,
///     Point3::new([0.0, 0.0, 0.0]),
///     Spacing3::new([1.0, 1.0, 2.0]),
///     Direction3::identity(),
/// );
/// assert_eq!(volume.shape(), [4, 5, 6]);
/// ```
#[derive(Debug, Clone)]
pub struct Volume<B: Backend, const D: usize> {
    data: Tensor<B, D>,
    geometry: VolumeGeometry<D>,
}

impl<B: Backend, const D: usize> Volume<B, D> {
    pub fn new(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        Self::from_geometry(data, VolumeGeometry::new(origin, spacing, direction))
    }

    pub fn from_geometry(data: Tensor<B, D>, geometry: VolumeGeometry<D>) -> Self {
        Self { data, geometry }
    }

    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    pub fn geometry(&self) -> &VolumeGeometry<D> {
        &self.geometry
    }

    /// Storage shape (`[Z, Y, X]` for 3-D).
    pub fn shape(&self) -> [usize; D] {
        self.data.dims()
    }

    /// Voxel values in storage order, converted to `f32`.
    pub fn values(&self) -> Vec<f32> {
        self.data.to_data().iter::<f32>().collect()
    }

    /// See [`VolumeGeometry::world_to_index_tensor`].
    pub fn world_to_index_tensor(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        self.geometry.world_to_index_tensor(points)
    }
}
