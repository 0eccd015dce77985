//! NIfTI-1 input and output for volumes, volume stacks and displacement
//! fields.
//!
//! On disk, axes run `x, y, z[, t]` fastest-first. In memory, volumes are
//! `[Z, Y, X]`, stacks are `[N, Z, Y, X]` and fields are `[3, Z, Y, X]`.

pub mod affine;
pub mod nifti_io;

pub use nifti_io::{
    read_displacement_field, read_stack, read_volume, read_volume_header, write_displacement_field,
    write_stack, write_volume,
};
