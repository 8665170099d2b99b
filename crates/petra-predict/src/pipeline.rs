//! End-to-end prediction preprocessing.
//!
//! Mirrors the acquisition-to-prediction flow: crop both modalities to the
//! MR foreground, regrid to the model's internal voxel size, normalize per
//! modality, predict, and undo the normalization. The crop box and zoom
//! factors are returned for reproducibility.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use nalgebra::Matrix4;
use petra_core::affine::{decompose, image_affine, to_array, to_image};
use petra_core::filter::resample_to_spacing;
use petra_core::interpolation::Interpolation;
use petra_core::spatial::Spacing3;
use serde::{Deserialize, Serialize};

use crate::crop::{crop, crop_affine, foreground_box, CropBox};
use crate::error::PredictError;
use crate::model::PredictionModel;
use crate::normalize::percentile;

/// Tunable parameters of the prediction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    /// Fraction of the MR maximum defining the foreground mask.
    pub foreground_fraction: f64,
    /// Normalization percentile for the PET volume.
    pub pet_percentile: f64,
    /// Normalization percentile for the MR volume.
    pub mr_percentile: f64,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            foreground_fraction: 0.1,
            pet_percentile: 99.99,
            mr_percentile: 99.99,
        }
    }
}

/// Reproducibility metadata: how the inputs were cropped and zoomed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionMeta {
    pub crop: CropBox,
    pub zoom: [f64; 3],
}

impl PredictionMeta {
    /// JSON sidecar content for persisting next to the predicted volume.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A predicted volume with its output affine and pipeline metadata.
pub struct Prediction<B: Backend> {
    pub volume: Tensor<B, 3>,
    pub affine: Matrix4<f64>,
    pub meta: PredictionMeta,
}

/// Run the full preprocessing + prediction pipeline.
///
/// `pet` and `mr` must share a voxel grid (the PET is expected to be
/// already aligned onto the MR, e.g. by
/// `petra_registration::align_volumes`); the MR affine defines the output
/// geometry, matching the convention of the enhancement workflow.
pub fn predict_volume<B: Backend, M: PredictionModel<B>>(
    pet: &Tensor<B, 3>,
    mr: &Tensor<B, 3>,
    mr_affine: &Matrix4<f64>,
    model: &M,
    config: &PredictConfig,
) -> Result<Prediction<B>, PredictError> {
    if pet.dims() != mr.dims() {
        return Err(PredictError::ShapeMismatch {
            pet: pet.dims(),
            mr: mr.dims(),
        });
    }

    // 1. Crop both modalities to the subject extent in the MR.
    let bbox = foreground_box(mr, config.foreground_fraction).ok_or(
        PredictError::EmptyForeground {
            threshold: config.foreground_fraction,
        },
    )?;
    let mr_crop = crop(mr, &bbox);
    let pet_crop = crop(pet, &bbox);
    let cropped_affine = crop_affine(mr_affine, &bbox);

    // 2. Regrid to the model's internal voxel size.
    let (_, mr_voxel_size, _) = decompose(mr_affine)?;
    let model_voxel_size = model.voxel_size();
    let zoom = [
        mr_voxel_size[0] / model_voxel_size[0],
        mr_voxel_size[1] / model_voxel_size[1],
        mr_voxel_size[2] / model_voxel_size[2],
    ];
    let target_spacing = Spacing3::new(model_voxel_size);

    let mr_image = to_image(mr_crop, &cropped_affine)?;
    let pet_image = to_image(pet_crop, &cropped_affine)?;
    let mr_zoomed = resample_to_spacing(&mr_image, target_spacing, Interpolation::Linear)?;
    let pet_zoomed = resample_to_spacing(&pet_image, target_spacing, Interpolation::Linear)?;

    let output_affine = image_affine(&mr_zoomed);
    let mr_zoomed = to_array(&mr_zoomed);
    let pet_zoomed = to_array(&pet_zoomed);

    // 3. Normalize each modality by its own percentile divisor.
    let pet_divisor = percentile(&pet_zoomed, config.pet_percentile).max(f32::EPSILON);
    let mr_divisor = percentile(&mr_zoomed, config.mr_percentile).max(f32::EPSILON);

    tracing::debug!(
        ?bbox,
        ?zoom,
        pet_divisor,
        mr_divisor,
        "prediction preprocessing"
    );

    let pet_norm = pet_zoomed.div_scalar(pet_divisor);
    let mr_norm = mr_zoomed.div_scalar(mr_divisor);

    // 4. Predict and restore the PET intensity scale.
    let predicted = model.predict(&pet_norm, &mr_norm)?;
    let volume = predicted.mul_scalar(pet_divisor);

    Ok(Prediction {
        volume,
        affine: output_affine,
        meta: PredictionMeta { crop: bbox, zoom },
    })
}
