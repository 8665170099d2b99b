use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::trait_::Transform;

/// The identity mapping. Used when regridding without co-registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl IdentityTransform {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Transform<B> for IdentityTransform {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        points
    }
}
