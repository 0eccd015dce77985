//! Cubic B-spline interpolation.
//!
//! Samples are first converted to B-spline coefficients with the recursive
//! prefilter of Unser et al. (mirror boundaries), so the interpolant passes
//! exactly through the voxel values. Evaluation then sums a 4x4x4 kernel
//! neighbourhood. Both steps run on the host.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

use super::trait_::Interpolator;

/// Pole of the cubic B-spline prefilter, `sqrt(3) - 2`.
const POLE: f64 = -0.267_949_192_431_122_7;
const TOLERANCE: f64 = 1e-10;

/// Cubic B-spline basis.
///
/// - (2/3) - |x|^2 + (1/2)|x|^3    for |x| < 1
/// - (1/6)(2 - |x|)^3              for 1 <= |x| < 2
/// - 0                             otherwise
fn cubic_bspline(x: f64) -> f64 {
    let abs_x = x.abs();
    if abs_x < 1.0 {
        (2.0 / 3.0) - abs_x.powi(2) + 0.5 * abs_x.powi(3)
    } else if abs_x < 2.0 {
        (2.0 - abs_x).powi(3) / 6.0
    } else {
        0.0
    }
}

/// Interpolating cubic B-spline.
#[derive(Debug, Clone, Copy, Default)]
pub struct BSplineInterpolator;

impl BSplineInterpolator {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for BSplineInterpolator {
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let device = indices.device();
        let shape = data.dims();

        let mut coefficients: Vec<f64> = data.to_data().iter::<f64>().collect();
        prefilter_volume(&mut coefficients, shape);

        let points: Vec<f64> = indices.into_data().iter::<f64>().collect();
        let values: Vec<f32> = points
            .chunks_exact(3)
            .map(|p| evaluate(&coefficients, shape, [p[0], p[1], p[2]]) as f32)
            .collect();

        let n = values.len();
        Tensor::from_data(TensorData::new(values, Shape::new([n])), &device)
    }
}

/// Run the 1-D prefilter along X, then Y, then Z of a `[Z, Y, X]` buffer.
fn prefilter_volume(coefficients: &mut [f64], [d, h, w]: [usize; 3]) {
    if coefficients.is_empty() {
        return;
    }

    for line in coefficients.chunks_exact_mut(w) {
        prefilter_line(line);
    }

    let mut scratch = Vec::with_capacity(h.max(d));
    for z in 0..d {
        for x in 0..w {
            filter_strided(coefficients, z * h * w + x, w, h, &mut scratch);
        }
    }
    for y in 0..h {
        for x in 0..w {
            filter_strided(coefficients, y * w + x, h * w, d, &mut scratch);
        }
    }
}

fn filter_strided(buffer: &mut [f64], start: usize, stride: usize, len: usize, scratch: &mut Vec<f64>) {
    scratch.clear();
    scratch.extend((0..len).map(|k| buffer[start + k * stride]));
    prefilter_line(scratch);
    for (k, value) in scratch.iter().enumerate() {
        buffer[start + k * stride] = *value;
    }
}

fn prefilter_line(line: &mut [f64]) {
    let n = line.len();
    if n < 2 {
        return;
    }

    let z = POLE;
    let gain = (1.0 - z) * (1.0 - 1.0 / z);
    for c in line.iter_mut() {
        *c *= gain;
    }

    line[0] = causal_initial(line, z);
    for k in 1..n {
        line[k] += z * line[k - 1];
    }

    line[n - 1] = (z / (z * z - 1.0)) * (z * line[n - 2] + line[n - 1]);
    for k in (0..n - 1).rev() {
        line[k] = z * (line[k + 1] - line[k]);
    }
}

fn causal_initial(line: &[f64], z: f64) -> f64 {
    let n = line.len();
    let horizon = (TOLERANCE.ln() / z.abs().ln()).ceil() as usize;

    if horizon < n {
        let mut zn = z;
        let mut sum = line[0];
        for &c in &line[1..horizon] {
            sum += zn * c;
            zn *= z;
        }
        sum
    } else {
        let iz = 1.0 / z;
        let mut zn = z;
        let mut z2n = z.powi(n as i32 - 1);
        let mut sum = line[0] + z2n * line[n - 1];
        z2n *= z2n * iz;
        for &c in &line[1..n - 1] {
            sum += (zn + z2n) * c;
            zn *= z;
            z2n *= iz;
        }
        sum / (1.0 - zn * zn)
    }
}

/// Reflect `i` into `0..n` (whole-sample symmetric extension).
fn mirror(i: i64, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as i64 - 1);
    let j = i.rem_euclid(period);
    if j >= n as i64 {
        (period - j) as usize
    } else {
        j as usize
    }
}

/// Kernel taps around `t`. `t` is clamped to `[-2, n + 1]` first; any
/// sample beyond that lies outside the volume and its value is discarded
/// by the caller's mask.
fn taps(t: f64, n: usize) -> [(usize, f64); 4] {
    let t = t.clamp(-2.0, n as f64 + 1.0);
    let base = t.floor() as i64 - 1;
    let mut out = [(0, 0.0); 4];
    for (k, tap) in out.iter_mut().enumerate() {
        let i = base + k as i64;
        *tap = (mirror(i, n), cubic_bspline(t - i as f64));
    }
    out
}

fn evaluate(coefficients: &[f64], [d, h, w]: [usize; 3], [x, y, z]: [f64; 3]) -> f64 {
    let tx = taps(x, w);
    let ty = taps(y, h);
    let tz = taps(z, d);

    let mut sum = 0.0;
    for &(zi, wz) in &tz {
        for &(yi, wy) in &ty {
            let row = (zi * h + yi) * w;
            let mut acc = 0.0;
            for &(xi, wx) in &tx {
                acc += wx * coefficients[row + xi];
            }
            sum += wz * wy * acc;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn ramp(shape: [usize; 3]) -> Tensor<TestBackend, 3> {
        let device = Default::default();
        let [d, h, w] = shape;
        let values: Vec<f32> = (0..d * h * w).map(|i| ((i * 7) % 11) as f32).collect();
        Tensor::<TestBackend, 1>::from_floats(values.as_slice(), &device).reshape(shape)
    }

    #[test]
    fn test_bspline_basis() {
        assert!((cubic_bspline(0.0) - 2.0 / 3.0).abs() < 1e-12);
        assert!((cubic_bspline(1.0) - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(cubic_bspline(2.0), 0.0);
        assert_eq!(cubic_bspline(-2.5), 0.0);
        assert!((cubic_bspline(0.5) - cubic_bspline(-0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_mirror_extension() {
        assert_eq!(mirror(-1, 4), 1);
        assert_eq!(mirror(4, 4), 2);
        assert_eq!(mirror(7, 4), 1);
        assert_eq!(mirror(5, 1), 0);
    }

    #[test]
    fn test_interpolates_voxel_values_exactly() {
        let device = Default::default();
        let data = ramp([3, 4, 5]);
        let expected: Vec<f32> = data.to_data().iter::<f32>().collect();

        let grid = crate::volume::generate_grid::<TestBackend>([3, 4, 5], &device);
        let values: Vec<f32> = BSplineInterpolator::new()
            .interpolate(&data, grid)
            .into_data()
            .iter::<f32>()
            .collect();

        for (got, want) in values.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-3, "expected {}, got {}", want, got);
        }
    }

    #[test]
    fn test_constant_volume_stays_constant() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 3>::full([4, 4, 4], 2.5, &device);
        let indices = Tensor::<TestBackend, 2>::from_floats(
            [[0.3, 1.7, 2.2], [3.0, 0.0, 1.5], [-0.4, 2.0, 3.9]],
            &device,
        );
        let values: Vec<f32> = BSplineInterpolator::new()
            .interpolate(&data, indices)
            .into_data()
            .iter::<f32>()
            .collect();
        for v in values {
            assert!((v - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_far_outside_indices_stay_finite() {
        let device = Default::default();
        let data = ramp([4, 4, 4]);
        let indices = Tensor::<TestBackend, 2>::from_floats(
            [[1e30, 0.0, 0.0], [0.0, -1e30, 0.0], [0.0, 0.0, f32::MAX]],
            &device,
        );
        let values: Vec<f32> = BSplineInterpolator::new()
            .interpolate(&data, indices)
            .into_data()
            .iter::<f32>()
            .collect();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_long_lines_use_truncated_initialisation() {
        let mut line: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
        let original = line.clone();
        prefilter_line(&mut line);

        let shape = [1, 1, 64];
        for (i, want) in original.iter().enumerate() {
            let got = evaluate(&line, shape, [i as f64, 0.0, 0.0]);
            assert!((got - want).abs() < 1e-6);
        }
    }
}
