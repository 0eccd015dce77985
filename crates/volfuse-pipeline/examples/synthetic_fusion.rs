//! Synthetic Fusion Example
//!
//! Builds a small destination grid and three shifted copies of a sphere,
//! each with the displacement field that undoes its shift, then fuses them.
//!
//! Usage:
//!   cargo run -p volfuse-pipeline --example synthetic_fusion

use std::sync::Arc;

use burn::tensor::Tensor;
use burn_ndarray::NdArray;
use volfuse_core::interpolation::Interpolation;
use volfuse_core::transform::DisplacementField;
use volfuse_core::{Volume, VolumeGeometry};
use volfuse_io::{read_volume, write_displacement_field, write_volume};
use volfuse_pipeline::{FusionRequest, LoggingObserver, Pipeline, PipelineParams, WarpPair};

type Backend = NdArray<f32>;

const SIZE: usize = 24;

/// Sphere of radius 6 centred at `centre` (voxel units, x y z).
fn sphere(centre: [f32; 3]) -> Tensor<Backend, 3> {
    let device = Default::default();
    let mut values = Vec::with_capacity(SIZE * SIZE * SIZE);
    for z in 0..SIZE {
        for y in 0..SIZE {
            for x in 0..SIZE {
                let d2 = (x as f32 - centre[0]).powi(2) + (y as f32 - centre[1]).powi(2) + (z as f32 - centre[2]).powi(2);
                values.push(if d2 <= 36.0 { 100.0 } else { 0.0 });
            }
        }
    }
    Tensor::<Backend, 1>::from_floats(values.as_slice(), &device).reshape([SIZE, SIZE, SIZE])
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let device = Default::default();
    let dir = tempfile::tempdir()?;
    let geometry = VolumeGeometry::default();
    let centre = SIZE as f32 / 2.0;

    let destination = dir.path().join("atlas.nii.gz");
    write_volume(&destination, &Volume::from_geometry(sphere([centre; 3]), geometry))?;

    let shifts = [[2.0, 0.0, 0.0], [0.0, -3.0, 0.0], [1.0, 1.0, 1.0]];
    let mut pairs = Vec::new();
    for (i, shift) in shifts.iter().enumerate() {
        let source = dir.path().join(format!("subject_{}.nii.gz", i));
        let moved = [centre + shift[0], centre + shift[1], centre + shift[2]];
        write_volume(&source, &Volume::from_geometry(sphere(moved), geometry))?;

        let field = dir.path().join(format!("subject_{}_warp.nii.gz", i));
        let displacement = DisplacementField::<Backend>::uniform([SIZE; 3], *shift, geometry, &device);
        write_displacement_field(&field, &displacement)?;

        pairs.push(WarpPair::new(source, field));
    }

    let output = dir.path().join("merged_images.nii.gz");
    let params = PipelineParams::new()
        .with_interpolation(Interpolation::Linear)
        .with_output(&output)
        .with_parallel_warps(true);
    let pipeline = Pipeline::nifti::<Backend>(params, device).with_observer(Arc::new(LoggingObserver));

    let report = pipeline.run(&FusionRequest::new(&destination, pairs)?)?;

    let merged = read_volume::<Backend, _>(&report.output, &Default::default())?;
    let atlas = read_volume::<Backend, _>(&destination, &Default::default())?;
    let max_error = merged
        .values()
        .iter()
        .zip(atlas.values())
        .map(|(m, a)| (m - a).abs())
        .fold(0.0f32, f32::max);

    println!("Merged {} images, shape {:?}", report.volumes, merged.shape());
    println!("Max deviation from the atlas sphere: {:.3}", max_error);
    Ok(())
}
