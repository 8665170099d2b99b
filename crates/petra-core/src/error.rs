//! Error types for geometry and resampling operations.

use thiserror::Error;

/// Errors raised when decomposing or applying affine geometry.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// A column of the affine's linear part has (near-)zero norm, so no
    /// direction cosine can be derived for that axis.
    #[error("degenerate affine: axis {axis} column norm {norm:e} is too small")]
    DegenerateAxis { axis: usize, norm: f64 },

    /// Voxel spacing must be strictly positive along every axis.
    #[error("non-positive spacing {value} on axis {axis}")]
    NonPositiveSpacing { axis: usize, value: f64 },

    /// The direction matrix is too far from orthonormal.
    #[error("direction matrix is not orthonormal (max deviation {deviation:e})")]
    NotOrthonormal { deviation: f64 },
}

/// Errors raised by the resampling filters.
#[derive(Error, Debug)]
pub enum ResampleError {
    /// The requested spacing produced an empty output grid along an axis.
    #[error("resampling to spacing {spacing} on axis {axis} yields size {size}")]
    EmptyAxis {
        axis: usize,
        spacing: f64,
        size: i64,
    },

    /// The requested output spacing is not strictly positive.
    #[error("target spacing {value} on axis {axis} is not positive")]
    InvalidSpacing { axis: usize, value: f64 },
}
