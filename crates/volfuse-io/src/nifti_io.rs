use std::path::Path;

use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use ndarray::{ArrayD, Axis, IxDyn};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use volfuse_core::transform::DisplacementField;
use volfuse_core::{Volume, VolumeGeometry, VolumeStack};

use crate::affine::{geometry_from_header, header_for_geometry};

/// `NIFTI_INTENT_VECTOR`
const INTENT_VECTOR: i16 = 1007;

fn read_array(path: &Path) -> Result<(NiftiHeader, ArrayD<f32>)> {
    let object = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("failed to read NIfTI file {}", path.display()))?;
    let header = object.header().clone();
    let array = object
        .into_volume()
        .into_ndarray::<f32>()
        .with_context(|| format!("failed to decode voxel data of {}", path.display()))?;
    Ok((header, array))
}

/// Geometry of `header`, rejecting a direction matrix that cannot be
/// inverted.
fn checked_geometry(header: &NiftiHeader, path: &Path) -> Result<VolumeGeometry<3>> {
    let geometry = geometry_from_header(header);
    if geometry.direction().try_inverse().is_none() {
        bail!("{} has a degenerate orientation matrix", path.display());
    }
    Ok(geometry)
}

/// Bring `array` to exactly `rank` axes by dropping trailing singleton axes
/// or appending singleton ones. Fails if a dropped axis is longer than 1.
fn conform_rank(mut array: ArrayD<f32>, rank: usize, path: &Path) -> Result<ArrayD<f32>> {
    while array.ndim() > rank {
        let last = array.ndim() - 1;
        if array.shape()[last] != 1 {
            bail!(
                "{} has shape {:?}, expected at most {} non-singleton axes",
                path.display(),
                array.shape(),
                rank
            );
        }
        array = array.index_axis_move(Axis(last), 0);
    }
    while array.ndim() < rank {
        let next = array.ndim();
        array = array.insert_axis(Axis(next));
    }
    Ok(array)
}

/// Disk order (fastest axis first) to a row-major tensor with axes reversed.
fn to_tensor<B: Backend, const D: usize>(array: ArrayD<f32>, device: &B::Device) -> Result<Tensor<B, D>> {
    let reversed = array.reversed_axes();
    let shape = <[usize; D]>::try_from(reversed.shape())
        .map_err(|_| anyhow::anyhow!("expected {} axes, found {}", D, reversed.ndim()))?;
    let values: Vec<f32> = reversed.iter().copied().collect();
    Ok(Tensor::from_data(TensorData::new(values, Shape::new(shape)), device))
}

/// Inverse of [`to_tensor`].
fn to_array<B: Backend, const D: usize>(tensor: &Tensor<B, D>) -> Result<ArrayD<f32>> {
    let dims = tensor.dims();
    let values: Vec<f32> = tensor.to_data().iter::<f32>().collect();
    let array = ArrayD::from_shape_vec(IxDyn(&dims), values).context("tensor shape does not match its data")?;
    Ok(array.reversed_axes())
}

/// Negate the x and y components of a `[x, y, z, 3]` field, converting
/// between ITK's LPS vectors and the RAS world of the NIfTI affine. The
/// conversion is its own inverse.
fn flip_lps_ras(array: &mut ArrayD<f32>) {
    let components = array.ndim() - 1;
    for axis in 0..2 {
        array.index_axis_mut(Axis(components), axis).mapv_inplace(|v| -v);
    }
}

fn write_array(path: &Path, header: &NiftiHeader, array: &ArrayD<f32>) -> Result<()> {
    WriterOptions::new(path)
        .reference_header(header)
        .write_nifti(array)
        .with_context(|| format!("failed to write NIfTI file {}", path.display()))
}

/// Read a 3-D volume. Trailing singleton axes (e.g. `t = 1`) are accepted.
pub fn read_volume<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Volume<B, 3>> {
    let path = path.as_ref();
    let (header, array) = read_array(path)?;
    let array = conform_rank(array, 3, path)?;
    let data = to_tensor::<B, 3>(array, device)?;

    tracing::debug!("read volume {} with shape {:?}", path.display(), data.dims());
    Ok(Volume::from_geometry(data, checked_geometry(&header, path)?))
}

/// Write a 3-D volume with its geometry encoded as sform.
pub fn write_volume<B: Backend, P: AsRef<Path>>(path: P, volume: &Volume<B, 3>) -> Result<()> {
    let path = path.as_ref();
    let header = header_for_geometry(volume.geometry());
    write_array(path, &header, &to_array(volume.data())?)?;

    tracing::debug!("wrote volume {} with shape {:?}", path.display(), volume.shape());
    Ok(())
}

/// Read a 4-D image as a stack of its `t` frames. A 3-D image is a stack of one.
pub fn read_stack<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<VolumeStack<B>> {
    let path = path.as_ref();
    let (header, array) = read_array(path)?;
    let array = conform_rank(array, 4, path)?;
    let data = to_tensor::<B, 4>(array, device)?;

    tracing::debug!("read stack {} with shape {:?}", path.display(), data.dims());
    Ok(VolumeStack::new(data, checked_geometry(&header, path)?))
}

/// Write a stack as a 4-D image, entry `n` at `t = n`.
pub fn write_stack<B: Backend, P: AsRef<Path>>(path: P, stack: &VolumeStack<B>) -> Result<()> {
    let path = path.as_ref();
    let header = header_for_geometry(stack.geometry());
    write_array(path, &header, &to_array(stack.data())?)?;

    tracing::debug!("wrote stack of {} volumes to {}", stack.len(), path.display());
    Ok(())
}

/// Read a dense displacement field.
///
/// Accepts the ITK vector-image layout `[x, y, z, 1, 3]`, whose vectors are
/// LPS physical displacements (as written by ANTs and ITK), and the plain
/// 4-D layout `[x, y, z, 3]`, whose vectors are already in the RAS world of
/// the affine. The returned field is always in RAS.
pub fn read_displacement_field<B: Backend, P: AsRef<Path>>(
    path: P,
    device: &B::Device,
) -> Result<DisplacementField<B>> {
    let path = path.as_ref();
    let (header, mut array) = read_array(path)?;

    let itk_layout = array.ndim() == 5;
    if itk_layout {
        if array.shape()[3] != 1 {
            bail!("{} has shape {:?}, expected [x, y, z, 1, 3]", path.display(), array.shape());
        }
        array = array.index_axis_move(Axis(3), 0);
    }
    if array.ndim() != 4 || array.shape()[3] != 3 {
        bail!(
            "{} has shape {:?}, expected a 3-component displacement field",
            path.display(),
            array.shape()
        );
    }

    if itk_layout {
        flip_lps_ras(&mut array);
    }

    let components = to_tensor::<B, 4>(array, device)?;
    tracing::debug!("read displacement field {} with shape {:?}", path.display(), components.dims());
    let field = DisplacementField::new(components, checked_geometry(&header, path)?)
        .with_context(|| format!("invalid displacement field {}", path.display()))?;
    Ok(field)
}

/// Write a displacement field as a `[x, y, z, 1, 3]` vector image with LPS
/// vectors.
pub fn write_displacement_field<B: Backend, P: AsRef<Path>>(path: P, field: &DisplacementField<B>) -> Result<()> {
    let path = path.as_ref();
    let header = NiftiHeader {
        intent_code: INTENT_VECTOR,
        ..header_for_geometry(field.geometry())
    };
    let mut array = to_array(field.components())?;
    flip_lps_ras(&mut array);
    write_array(path, &header, &array.insert_axis(Axis(3)))
}

/// Geometry and `[Z, Y, X]` shape of a volume without decoding voxel data.
pub fn read_volume_header<P: AsRef<Path>>(path: P) -> Result<([usize; 3], VolumeGeometry<3>)> {
    let path = path.as_ref();
    let header = NiftiHeader::from_file(path)
        .with_context(|| format!("failed to read NIfTI header of {}", path.display()))?;

    let rank = usize::from(header.dim[0]);
    let extent = |axis: usize| if axis <= rank { usize::from(header.dim[axis]).max(1) } else { 1 };
    Ok(([extent(3), extent(2), extent(1)], checked_geometry(&header, path)?))
}
