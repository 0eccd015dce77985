//! Voxel-wise mean of co-registered volumes.

use burn::tensor::backend::Backend;

use crate::volume::{StackError, Volume, VolumeStack};

/// Mean along the stacking axis. The result keeps the stack geometry.
pub fn mean_across_stack<B: Backend>(stack: &VolumeStack<B>) -> Volume<B, 3> {
    let mean = stack.data().clone().mean_dim(0).squeeze::<3>(0);
    Volume::from_geometry(mean, *stack.geometry())
}

/// Stack `volumes` in order and average them.
///
/// Fails on an empty slice or when any shape differs from the first.
pub fn merge_volumes<B: Backend>(volumes: &[Volume<B, 3>]) -> Result<Volume<B, 3>, StackError> {
    let stack = VolumeStack::from_volumes(volumes)?;
    Ok(mean_across_stack(&stack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeGeometry;
    use burn::tensor::Tensor;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn constant(value: f32, shape: [usize; 3]) -> Volume<TestBackend, 3> {
        let device = Default::default();
        Volume::from_geometry(Tensor::full(shape, value, &device), VolumeGeometry::default())
    }

    #[test]
    fn test_mean_of_two() {
        let merged = merge_volumes(&[constant(2.0, [2, 2, 2]), constant(4.0, [2, 2, 2])]).unwrap();
        assert_eq!(merged.shape(), [2, 2, 2]);
        assert!(merged.values().iter().all(|&v| (v - 3.0).abs() < 1e-6));
    }

    #[test]
    fn test_single_volume_is_identity() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0, 3.0, 4.0], &device).reshape([1, 2, 2]);
        let volume = Volume::from_geometry(data, VolumeGeometry::default());

        let merged = merge_volumes(std::slice::from_ref(&volume)).unwrap();
        assert_eq!(merged.values(), volume.values());
    }

    #[test]
    fn test_mismatch_reports_first_offender() {
        let err = merge_volumes(&[
            constant(1.0, [2, 2, 2]),
            constant(1.0, [2, 2, 2]),
            constant(1.0, [2, 2, 3]),
            constant(1.0, [3, 2, 2]),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            StackError::ShapeMismatch { index: 2, expected: vec![2, 2, 2], actual: vec![2, 2, 3] }
        );
    }

    #[test]
    fn test_empty_is_rejected() {
        assert_eq!(merge_volumes::<TestBackend>(&[]).unwrap_err(), StackError::Empty);
    }
}
