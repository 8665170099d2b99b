//! Interpolator trait.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Samples voxel values at continuous indices.
///
/// Out-of-range indices are clamped to the volume border; masking them to a
/// fill value is the resample filter's responsibility.
pub trait Interpolator<B: Backend> {
    /// Sample a `[Z, Y, X]` volume at `[N, 3]` continuous `(x, y, z)` indices.
    ///
    /// Returns the `[N]` sampled values.
    fn sample(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}
