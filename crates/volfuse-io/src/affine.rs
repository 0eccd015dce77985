//! Conversion between a NIfTI header's spatial encoding and
//! [`VolumeGeometry`].

use nalgebra::{Matrix3, Vector3};
use nifti::NiftiHeader;
use volfuse_core::spatial::{Direction, Point, Spacing, Vector};
use volfuse_core::VolumeGeometry;

/// `NIFTI_XFORM_SCANNER_ANAT`
const XFORM_SCANNER_ANAT: i16 = 1;

/// Index-to-physical affine, row-major, last row implied `[0, 0, 0, 1]`.
pub type Affine = [[f64; 4]; 3];

/// Affine of `header`, preferring sform, then qform, then bare pixdim.
pub fn header_affine(header: &NiftiHeader) -> Affine {
    if header.sform_code > 0 {
        let row = |r: [f32; 4]| r.map(f64::from);
        [row(header.srow_x), row(header.srow_y), row(header.srow_z)]
    } else if header.qform_code > 0 {
        qform_affine(header)
    } else {
        let pixdim = |i: usize| f64::from(header.pixdim[i]);
        [
            [pixdim(1), 0.0, 0.0, 0.0],
            [0.0, pixdim(2), 0.0, 0.0],
            [0.0, 0.0, pixdim(3), 0.0],
        ]
    }
}

fn qform_affine(header: &NiftiHeader) -> Affine {
    let b = f64::from(header.quatern_b);
    let c = f64::from(header.quatern_c);
    let d = f64::from(header.quatern_d);
    let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

    let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
    let dx = f64::from(header.pixdim[1]);
    let dy = f64::from(header.pixdim[2]);
    let dz = f64::from(header.pixdim[3]) * qfac;

    let r = [
        [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
        [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
        [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - b * b - c * c],
    ];
    let offset = [header.quatern_x, header.quatern_y, header.quatern_z].map(f64::from);

    let mut affine = [[0.0; 4]; 3];
    for (row, out) in affine.iter_mut().enumerate() {
        *out = [r[row][0] * dx, r[row][1] * dy, r[row][2] * dz, offset[row]];
    }
    affine
}

/// Split an affine into origin, per-axis spacing (column norms) and
/// unit-column direction cosines.
pub fn geometry_from_affine(affine: &Affine) -> VolumeGeometry<3> {
    let origin = Point::new([affine[0][3], affine[1][3], affine[2][3]]);

    let mut spacing = Vector::<3>::zeros();
    let mut columns = [Vector3::x(), Vector3::y(), Vector3::z()];
    for (axis, column) in columns.iter_mut().enumerate() {
        let raw = Vector3::new(affine[0][axis], affine[1][axis], affine[2][axis]);
        let norm = raw.norm();
        if norm > 1e-9 {
            spacing[axis] = norm;
            *column = raw / norm;
        } else {
            spacing[axis] = 1.0;
        }
    }

    VolumeGeometry::new(origin, spacing, Direction(Matrix3::from_columns(&columns)))
}

pub fn geometry_from_header(header: &NiftiHeader) -> VolumeGeometry<3> {
    geometry_from_affine(&header_affine(header))
}

pub fn affine_from_geometry(geometry: &VolumeGeometry<3>) -> Affine {
    let origin = geometry.origin();
    let spacing: &Spacing<3> = geometry.spacing();
    let direction = geometry.direction();

    let mut affine = [[0.0; 4]; 3];
    for (row, out) in affine.iter_mut().enumerate() {
        for col in 0..3 {
            out[col] = direction[(row, col)] * spacing[col];
        }
        out[3] = origin[row];
    }
    affine
}

/// Header carrying `geometry` as a scanner-anatomical sform.
///
/// `dim` and `datatype` are filled in by the writer from the array.
pub fn header_for_geometry(geometry: &VolumeGeometry<3>) -> NiftiHeader {
    let affine = affine_from_geometry(geometry);
    let spacing = geometry.spacing();
    let row = |r: usize| affine[r].map(|v| v as f32);

    let mut pixdim = [1.0; 8];
    for axis in 0..3 {
        pixdim[axis + 1] = spacing[axis] as f32;
    }

    NiftiHeader {
        sform_code: XFORM_SCANNER_ANAT,
        qform_code: 0,
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        pixdim,
        ..NiftiHeader::default()
    }
}
