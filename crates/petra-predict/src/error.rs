//! Error types for the prediction pipeline.

use petra_core::{GeometryError, ResampleError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    /// No voxel exceeded the foreground threshold; nothing to crop to.
    #[error("foreground mask is empty at threshold fraction {threshold}")]
    EmptyForeground { threshold: f64 },

    /// PET and MR volumes must share a voxel grid.
    #[error("volume shape mismatch: PET {pet:?} vs MR {mr:?}")]
    ShapeMismatch { pet: [usize; 3], mr: [usize; 3] },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Resample(#[from] ResampleError),

    /// Failure inside the opaque prediction model.
    #[error("prediction model failed: {0}")]
    Model(String),
}
