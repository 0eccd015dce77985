//! N volumes stacked along a new leading tensor axis.
//!
//! On disk the stacking axis is the trailing "t" axis of a 4-D image; in
//! memory it is the leading axis so each volume stays contiguous.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use thiserror::Error;

use super::{Volume, VolumeGeometry};

/// Reasons a set of volumes cannot be stacked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("cannot stack an empty set of volumes")]
    Empty,

    /// `index` is the position of the first volume whose shape differs
    /// from volume 0.
    #[error("volume {index} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

/// Equally shaped 3-D volumes sharing the geometry of the first one.
///
/// `data` is `[N, Z, Y, X]` with entry `n` holding the `n`-th input in the
/// order it was given.
#[derive(Debug, Clone)]
pub struct VolumeStack<B: Backend> {
    data: Tensor<B, 4>,
    geometry: VolumeGeometry<3>,
}

impl<B: Backend> VolumeStack<B> {
    pub fn new(data: Tensor<B, 4>, geometry: VolumeGeometry<3>) -> Self {
        Self { data, geometry }
    }

    /// Stack `volumes` in order. Every shape must equal the first one.
    pub fn from_volumes(volumes: &[Volume<B, 3>]) -> Result<Self, StackError> {
        let first = volumes.first().ok_or(StackError::Empty)?;
        let expected = first.shape();

        if let Some((index, mismatched)) = volumes
            .iter()
            .enumerate()
            .find(|(_, volume)| volume.shape() != expected)
        {
            return Err(StackError::ShapeMismatch {
                index,
                expected: expected.to_vec(),
                actual: mismatched.shape().to_vec(),
            });
        }

        let tensors: Vec<Tensor<B, 3>> = volumes.iter().map(|v| v.data().clone()).collect();
        Ok(Self::new(Tensor::stack(tensors, 0), *first.geometry()))
    }

    pub fn data(&self) -> &Tensor<B, 4> {
        &self.data
    }

    pub fn geometry(&self) -> &VolumeGeometry<3> {
        &self.geometry
    }

    /// Number of stacked volumes.
    pub fn len(&self) -> usize {
        self.data.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spatial shape `[Z, Y, X]` shared by every entry.
    pub fn volume_shape(&self) -> [usize; 3] {
        let [_, z, y, x] = self.data.dims();
        [z, y, x]
    }

    /// Entry `index` as a standalone volume.
    pub fn volume(&self, index: usize) -> Option<Volume<B, 3>> {
        if index >= self.len() {
            return None;
        }
        let [z, y, x] = self.volume_shape();
        let slab = self
            .data
            .clone()
            .slice([index..index + 1, 0..z, 0..y, 0..x])
            .reshape([z, y, x]);
        Some(Volume::from_geometry(slab, self.geometry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn constant(value: f32, shape: [usize; 3]) -> Volume<TestBackend, 3> {
        let device = Default::default();
        Volume::from_geometry(Tensor::full(shape, value, &device), VolumeGeometry::default())
    }

    #[test]
    fn test_stack_preserves_order() {
        let stack = VolumeStack::from_volumes(&[
            constant(1.0, [2, 3, 4]),
            constant(2.0, [2, 3, 4]),
            constant(3.0, [2, 3, 4]),
        ])
        .unwrap();

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.volume_shape(), [2, 3, 4]);
        assert_eq!(stack.volume(1).unwrap().values(), vec![2.0; 24]);
        assert!(stack.volume(3).is_none());
    }

    #[test]
    fn test_stack_reports_first_mismatch() {
        let err = VolumeStack::from_volumes(&[
            constant(1.0, [2, 3, 4]),
            constant(1.0, [2, 3, 4]),
            constant(1.0, [2, 3, 5]),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            StackError::ShapeMismatch {
                index: 2,
                expected: vec![2, 3, 4],
                actual: vec![2, 3, 5],
            }
        );
    }

    #[test]
    fn test_empty_stack_rejected() {
        let err = VolumeStack::<TestBackend>::from_volumes(&[]).unwrap_err();
        assert_eq!(err, StackError::Empty);
    }
}
