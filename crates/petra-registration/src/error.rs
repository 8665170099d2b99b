//! Error types for registration workflows.

use petra_core::{GeometryError, ResampleError};
use thiserror::Error;

/// Errors raised while configuring or running a registration.
///
/// Optimizer non-convergence is not an error: the engine returns its
/// best-effort transform with a [`crate::report::RegistrationReport`]
/// describing how each level stopped.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
