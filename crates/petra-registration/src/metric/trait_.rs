//! Metric trait.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use petra_core::image::Image;
use petra_core::transform::Transform;

/// Dissimilarity between a fixed and a transformed moving image.
///
/// `transform` maps fixed-space physical points into moving space. The
/// returned scalar tensor is a loss: lower values mean better alignment,
/// and it stays on the autodiff graph so the engine can backpropagate
/// through the transform parameters.
pub trait Metric<B: Backend> {
    fn loss(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
        transform: &impl Transform<B>,
    ) -> Tensor<B, 1>;

    fn name(&self) -> &'static str;
}
