//! The opaque prediction model seam.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::PredictError;

/// A learned model mapping a normalized (PET, MR) pair to an enhanced PET.
///
/// Inputs are single-channel 3D volumes on the same grid, already cropped,
/// regridded to the model's internal voxel size, and normalized. Batch or
/// channel dimension handling is the implementation's concern.
pub trait PredictionModel<B: Backend> {
    fn predict(
        &self,
        pet: &Tensor<B, 3>,
        mr: &Tensor<B, 3>,
    ) -> Result<Tensor<B, 3>, PredictError>;

    /// Voxel size (mm) the model was trained on.
    fn voxel_size(&self) -> [f64; 3];
}
