//! Direction cosine matrix type.

use super::Vector;
use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Orientation of the image axes in physical space.
///
/// Columns are the physical-space unit vectors of the image axes. Valid
/// directions are (approximately) orthonormal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    pub fn from_matrix(matrix: SMatrix<f64, D, D>) -> Self {
        Self(matrix)
    }

    /// Maximum absolute deviation of `Dᵀ·D` from the identity.
    pub fn orthonormality_deviation(&self) -> f64 {
        let gram = self.0.transpose() * self.0;
        let mut deviation: f64 = 0.0;
        for r in 0..D {
            for c in 0..D {
                let expected = if r == c { 1.0 } else { 0.0 };
                deviation = deviation.max((gram[(r, c)] - expected).abs());
            }
        }
        deviation
    }

    /// Validate approximate orthonormality.
    pub fn checked(matrix: SMatrix<f64, D, D>, tolerance: f64) -> Result<Self, GeometryError> {
        let direction = Self(matrix);
        let deviation = direction.orthonormality_deviation();
        if deviation > tolerance {
            return Err(GeometryError::NotOrthonormal { deviation });
        }
        Ok(direction)
    }

    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    pub fn inner(&self) -> &SMatrix<f64, D, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}

impl<const D: usize> std::ops::Mul for Direction<D> {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        Self(self.0 * other.0)
    }
}
