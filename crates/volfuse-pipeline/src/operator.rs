//! The two collaborators a fusion run drives: applying a warp to one
//! source, and reducing the warped set to one volume.

use std::path::{Path, PathBuf};

use anyhow::Context;
use burn::tensor::backend::Backend;
use volfuse_core::filter::{mean_across_stack, ResampleFilter};
use volfuse_core::interpolation::Interpolation;
use volfuse_core::VolumeStack;
use volfuse_io::{
    read_displacement_field, read_stack, read_volume, read_volume_header, write_stack, write_volume,
};

use crate::error::{FusionError, Result};

/// Resamples `source` onto the grid of `destination` through `field` and
/// writes the result to `output`.
///
/// Errors are plain `anyhow` errors; the warp stage attaches the index and
/// paths.
pub trait WarpOperator: Send + Sync {
    fn apply_warp(
        &self,
        source: &Path,
        destination: &Path,
        field: &Path,
        interpolation: Interpolation,
        output: &Path,
    ) -> anyhow::Result<()>;
}

pub trait ReduceOperator: Send + Sync {
    /// Stack `inputs` in order along a new trailing axis.
    fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;

    /// Voxel-wise mean across the trailing axis of `input`.
    fn mean(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Both operators over NIfTI files, computed with burn tensors on `device`.
#[derive(Debug, Clone)]
pub struct NiftiOperators<B: Backend> {
    device: B::Device,
}

impl<B: Backend> Default for NiftiOperators<B> {
    fn default() -> Self {
        Self::new(B::Device::default())
    }
}

impl<B: Backend> NiftiOperators<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

impl<B: Backend> WarpOperator for NiftiOperators<B> {
    fn apply_warp(
        &self,
        source: &Path,
        destination: &Path,
        field: &Path,
        interpolation: Interpolation,
        output: &Path,
    ) -> anyhow::Result<()> {
        let (shape, geometry) = read_volume_header(destination).context("reading destination grid")?;
        let moving = read_volume::<B, _>(source, &self.device).context("reading source image")?;
        let field = read_displacement_field::<B, _>(field, &self.device).context("reading warp field")?;

        tracing::debug!(
            "resampling {} onto {:?} with {} interpolation",
            source.display(),
            shape,
            interpolation
        );
        let warped = ResampleFilter::new(shape, geometry, field, interpolation).apply(&moving);

        write_volume(output, &warped).context("writing warped image")
    }
}

impl<B: Backend> ReduceOperator for NiftiOperators<B> {
    fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let volumes = inputs
            .iter()
            .map(|path| read_volume::<B, _>(path, &self.device))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| FusionError::reduction("concat", format!("{:#}", e)))?;

        let stack = VolumeStack::from_volumes(&volumes)?;
        write_stack(output, &stack).map_err(|e| FusionError::reduction("concat", format!("{:#}", e)))
    }

    fn mean(&self, input: &Path, output: &Path) -> Result<()> {
        let stack = read_stack::<B, _>(input, &self.device)
            .map_err(|e| FusionError::reduction("mean", format!("{:#}", e)))?;
        if stack.is_empty() {
            return Err(FusionError::reduction("mean", "stack has no volumes"));
        }

        let merged = mean_across_stack(&stack);
        write_volume(output, &merged).map_err(|e| FusionError::reduction("mean", format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;
    use burn_ndarray::NdArray;
    use tempfile::tempdir;
    use volfuse_core::transform::DisplacementField;
    use volfuse_core::{Volume, VolumeGeometry};
    use volfuse_io::write_displacement_field;

    type TestBackend = NdArray<f32>;

    fn write_constant(path: &Path, shape: [usize; 3], value: f32) {
        let device = Default::default();
        let volume = Volume::<TestBackend, 3>::from_geometry(
            Tensor::full(shape, value, &device),
            VolumeGeometry::default(),
        );
        write_volume(path, &volume).unwrap();
    }

    #[test]
    fn test_warp_produces_destination_grid() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.nii");
        let destination = dir.path().join("dest.nii");
        let field_path = dir.path().join("warp.nii.gz");
        let output = dir.path().join("warped.nii");

        write_constant(&source, [4, 4, 4], 5.0);
        write_constant(&destination, [2, 3, 2], 0.0);
        let device = Default::default();
        let field = DisplacementField::<TestBackend>::zeros([2, 3, 2], VolumeGeometry::default(), &device);
        write_displacement_field(&field_path, &field).unwrap();

        let operators = NiftiOperators::<TestBackend>::default();
        operators
            .apply_warp(&source, &destination, &field_path, Interpolation::Linear, &output)
            .unwrap();

        let warped = read_volume::<TestBackend, _>(&output, &device).unwrap();
        assert_eq!(warped.shape(), [2, 3, 2]);
        assert!(warped.values().iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_warp_with_unreadable_field_fails() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.nii");
        write_constant(&source, [2, 2, 2], 1.0);
        let bogus = dir.path().join("warp.nii");
        std::fs::write(&bogus, b"not a nifti file").unwrap();

        let operators = NiftiOperators::<TestBackend>::default();
        let err = operators
            .apply_warp(&source, &source, &bogus, Interpolation::NearestNeighbor, &dir.path().join("out.nii"))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("reading warp field"));
        assert!(!dir.path().join("out.nii").exists());
    }

    #[test]
    fn test_concat_then_mean() {
        let dir = tempdir().unwrap();
        let inputs: Vec<PathBuf> = (0..3).map(|i| dir.path().join(format!("input_{}_reg.nii", i))).collect();
        for (i, path) in inputs.iter().enumerate() {
            write_constant(path, [2, 2, 2], i as f32 * 3.0);
        }

        let operators = NiftiOperators::<TestBackend>::default();
        let concat = dir.path().join("concat_image.nii");
        let merged = dir.path().join("merged_image.nii");
        operators.concat(&inputs, &concat).unwrap();
        operators.mean(&concat, &merged).unwrap();

        let device = Default::default();
        let stack = read_stack::<TestBackend, _>(&concat, &device).unwrap();
        assert_eq!(stack.len(), 3);
        let result = read_volume::<TestBackend, _>(&merged, &device).unwrap();
        assert!(result.values().iter().all(|&v| (v - 3.0).abs() < 1e-6));
    }

    #[test]
    fn test_concat_shape_mismatch_writes_nothing() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.nii");
        let b = dir.path().join("b.nii");
        write_constant(&a, [2, 2, 2], 1.0);
        write_constant(&b, [2, 2, 3], 1.0);

        let concat = dir.path().join("concat_image.nii");
        let operators = NiftiOperators::<TestBackend>::default();
        let err = operators.concat(&[a, b], &concat).unwrap_err();

        match err {
            FusionError::ShapeMismatch { index, expected, actual } => {
                assert_eq!(index, 1);
                assert_eq!(expected, vec![2, 2, 2]);
                assert_eq!(actual, vec![2, 2, 3]);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!concat.exists());
    }

    #[test]
    fn test_mean_of_missing_stack_is_reduction_error() {
        let dir = tempdir().unwrap();
        let operators = NiftiOperators::<TestBackend>::default();
        let err = operators
            .mean(&dir.path().join("absent.nii"), &dir.path().join("merged.nii"))
            .unwrap_err();
        assert!(matches!(err, FusionError::Reduction { operation: "mean", .. }));
    }
}
