//! Transform trait.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Maps physical points from one space to another.
///
/// In registration and resampling the transform maps output-space (fixed)
/// points into input-space (moving) points.
pub trait Transform<B: Backend> {
    /// Apply the transform to a `[N, 3]` batch of physical points.
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}
