//! Interpolator trait.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Samples a volume at non-integer voxel positions.
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait Interpolator<B: Backend> {
    /// Interpolate `data` (`[Z, Y, X]`) at `indices` (`[N, 3]`, `(x, y, z)`).
    ///
    /// Positions outside the grid are resolved by each implementation's
    /// boundary rule; callers that need a background value mask them.
    ///
    /// # Returns
    /// Tensor of sampled values `[N]`
    fn interpolate(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}
