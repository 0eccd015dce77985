//! Resample filter.
//!
//! Produces a volume on a chosen output grid by pulling each output voxel
//! through a transform into the input volume and interpolating there.

use std::marker::PhantomData;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::interpolation::Interpolator;
use crate::transform::Transform;
use crate::volume::{generate_grid, Volume, VolumeGeometry};

/// Half a voxel of slack around the input grid before a sample counts as
/// outside the field of view.
const INSIDE_MARGIN: f64 = 0.5;

/// Resample filter.
///
/// The transform maps output physical space → input physical space, which
/// is the direction a destination-defined warp field is stored in.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `T` - The transform type
/// * `I` - The interpolator type
pub struct ResampleFilter<B, T, I>
where
    B: Backend,
    T: Transform<B, 3>,
    I: Interpolator<B>,
{
    size: [usize; 3],
    geometry: VolumeGeometry<3>,
    transform: T,
    interpolator: I,
    default_value: f32,
    _phantom: PhantomData<B>,
}

impl<B, T, I> ResampleFilter<B, T, I>
where
    B: Backend,
    T: Transform<B, 3>,
    I: Interpolator<B>,
{
    /// # Arguments
    /// * `size` - Output shape `[Z, Y, X]`
    /// * `geometry` - Output placement in physical space
    /// * `transform` - Output space → input space
    /// * `interpolator` - Sampler for the input volume
    pub fn new(size: [usize; 3], geometry: VolumeGeometry<3>, transform: T, interpolator: I) -> Self {
        Self {
            size,
            geometry,
            transform,
            interpolator,
            default_value: 0.0,
            _phantom: PhantomData,
        }
    }

    /// Output grid copied from `reference` (shape and geometry).
    pub fn from_reference(reference: &Volume<B, 3>, transform: T, interpolator: I) -> Self {
        Self::new(reference.shape(), *reference.geometry(), transform, interpolator)
    }

    /// Value written where the transformed point falls outside the input.
    pub fn with_default_value(mut self, value: f32) -> Self {
        self.default_value = value;
        self
    }

    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    pub fn apply(&self, input: &Volume<B, 3>) -> Volume<B, 3> {
        let device = input.data().device();

        let output_indices = generate_grid::<B>(self.size, &device);
        let output_points = self.geometry.index_to_world_tensor(output_indices);
        let input_points = self.transform.transform_points(output_points);
        let input_indices = input.world_to_index_tensor(input_points);

        let inside = inside_mask(&input_indices, input.shape());
        let sampled = self.interpolator.interpolate(input.data(), input_indices);

        let values = if self.default_value == 0.0 {
            sampled * inside
        } else {
            let outside = inside.ones_like() - inside.clone();
            sampled * inside + outside * self.default_value
        };

        Volume::from_geometry(values.reshape(self.size), self.geometry)
    }
}

/// 1.0 where a continuous index lies within the grid (± half a voxel),
/// 0.0 elsewhere.
fn inside_mask<B: Backend>(indices: &Tensor<B, 2>, [d, h, w]: [usize; 3]) -> Tensor<B, 1> {
    // index column -> extent along that axis
    let extents = [w, h, d];
    let mut mask: Option<Tensor<B, 1>> = None;

    for (axis, extent) in extents.into_iter().enumerate() {
        let coord = indices.clone().narrow(1, axis, 1).squeeze::<1>(1);
        let lower = coord.clone().greater_equal_elem(-INSIDE_MARGIN).float();
        let upper = coord
            .lower_equal_elem(extent as f64 - 1.0 + INSIDE_MARGIN)
            .float();
        let axis_mask = lower * upper;
        mask = Some(match mask {
            Some(m) => m * axis_mask,
            None => axis_mask,
        });
    }

    mask.unwrap_or_else(|| Tensor::ones([indices.dims()[0]], &indices.device()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::{Interpolation, LinearInterpolator, NearestNeighborInterpolator};
    use crate::spatial::{Direction, Point, Spacing};
    use crate::transform::DisplacementField;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    /// 1 x 1 x 6 line with value = x index.
    fn line() -> Volume<TestBackend, 3> {
        let device = Default::default();
        let data = Tensor::<TestBackend, 1>::from_floats([0.0, 1.0, 2.0, 3.0, 4.0, 5.0], &device)
            .reshape([1, 1, 6]);
        Volume::from_geometry(data, VolumeGeometry::default())
    }

    #[test]
    fn test_identity_warp_reproduces_input() {
        let device = Default::default();
        let source = line();
        let field = DisplacementField::zeros([1, 1, 6], VolumeGeometry::default(), &device);
        let filter = ResampleFilter::from_reference(&source, field, NearestNeighborInterpolator);

        let out = filter.apply(&source);
        assert_eq!(out.shape(), [1, 1, 6]);
        assert_eq!(out.values(), source.values());
    }

    #[test]
    fn test_shift_pulls_from_displaced_position() {
        let device = Default::default();
        let source = line();
        let field = DisplacementField::uniform([1, 1, 6], [2.0, 0.0, 0.0], VolumeGeometry::default(), &device);
        let filter = ResampleFilter::from_reference(&source, field, LinearInterpolator);

        // out[x] = in[x + 2]; x = 4, 5 fall outside -> 0
        assert_eq!(filter.apply(&source).values(), vec![2.0, 3.0, 4.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_default_value_fills_outside() {
        let device = Default::default();
        let source = line();
        let field = DisplacementField::uniform([1, 1, 6], [-3.0, 0.0, 0.0], VolumeGeometry::default(), &device);
        let filter = ResampleFilter::from_reference(&source, field, Interpolation::NearestNeighbor)
            .with_default_value(-1.0);

        assert_eq!(filter.apply(&source).values(), vec![-1.0, -1.0, -1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_extreme_displacement_yields_default() {
        let device = Default::default();
        let source = line();
        let field = DisplacementField::uniform([1, 1, 6], [1e30, 0.0, 0.0], VolumeGeometry::default(), &device);
        let filter = ResampleFilter::from_reference(&source, field, Interpolation::Spline);

        assert_eq!(filter.apply(&source).values(), vec![0.0; 6]);
    }

    #[test]
    fn test_output_takes_reference_grid() {
        let device = Default::default();
        let source = line();

        // destination: 3 voxels of 2 mm starting at x = 1
        let destination_geometry = VolumeGeometry::new(
            Point::new([1.0, 0.0, 0.0]),
            Spacing::new([2.0, 1.0, 1.0]),
            Direction::identity(),
        );
        let field = DisplacementField::zeros([1, 1, 3], destination_geometry, &device);
        let filter = ResampleFilter::new([1, 1, 3], destination_geometry, field, LinearInterpolator);

        let out = filter.apply(&source);
        assert_eq!(out.shape(), [1, 1, 3]);
        assert_eq!(out.geometry(), &destination_geometry);
        assert_eq!(out.values(), vec![1.0, 3.0, 5.0]);
    }
}
