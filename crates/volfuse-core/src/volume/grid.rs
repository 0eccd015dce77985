use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

/// Continuous indices of every voxel of a `[Z, Y, X]` grid.
///
/// Returns `[Z * Y * X, 3]` rows of `(x, y, z)` in storage order, so row `k`
/// addresses the `k`-th element of the flattened volume.
pub fn generate_grid<B: Backend>(shape: [usize; 3], device: &B::Device) -> Tensor<B, 2> {
    let [d, h, w] = shape;
    let total = d * h * w;

    let mut grid = Vec::with_capacity(total * 3);
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                grid.push(x as f32);
                grid.push(y as f32);
                grid.push(z as f32);
            }
        }
    }

    Tensor::<B, 1>::from_data(TensorData::new(grid, Shape::new([total * 3])), device)
        .reshape([total, 3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    #[test]
    fn test_grid_rows_follow_storage_order() {
        let device = Default::default();
        let grid = generate_grid::<NdArray<f32>>([2, 1, 3], &device);
        assert_eq!(grid.dims(), [6, 3]);

        let data = grid.into_data();
        let rows = data.as_slice::<f32>().unwrap();
        // row 4 -> z = 1, y = 0, x = 1
        assert_eq!(&rows[12..15], &[1.0, 0.0, 1.0]);
    }
}
