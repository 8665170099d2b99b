//! Conversions between voxel-array + affine and physical-space images.
//!
//! Caller-facing volumes are `(x, y, z)`-ordered tensors with a 4×4 affine
//! mapping voxel indices to physical coordinates. [`Image`] stores its data
//! `(z, y, x)`. The axis permutation between the two conventions happens
//! here and nowhere else.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use nalgebra::{Matrix3, Matrix4, Vector3 as NaVector3};

use crate::error::GeometryError;
use crate::image::Image;
use crate::spatial::{Direction3, Point3, Spacing3};

/// Minimum column norm below which an affine axis counts as degenerate.
const DEGENERATE_NORM: f64 = 1e-12;

/// Split an affine into origin, spacing, and direction cosines.
///
/// The translation column gives the origin; each column of the linear part
/// is normalized to unit length to form the direction matrix, and the norms
/// become the spacing.
pub fn decompose(affine: &Matrix4<f64>) -> Result<(Point3, Spacing3, Direction3), GeometryError> {
    let origin = Point3::new([affine[(0, 3)], affine[(1, 3)], affine[(2, 3)]]);

    let mut spacing = [0.0f64; 3];
    let mut columns = [NaVector3::zeros(); 3];
    for axis in 0..3 {
        let column = NaVector3::new(affine[(0, axis)], affine[(1, axis)], affine[(2, axis)]);
        let norm = column.norm();
        if norm < DEGENERATE_NORM {
            return Err(GeometryError::DegenerateAxis { axis, norm });
        }
        spacing[axis] = norm;
        columns[axis] = column / norm;
    }

    let direction = Direction3::from_matrix(Matrix3::from_columns(&columns));
    Ok((origin, Spacing3::new(spacing), direction))
}

/// Rebuild the 4×4 affine from origin, spacing, and direction.
///
/// Inverse of [`decompose`] up to floating-point rounding.
pub fn compose(origin: &Point3, spacing: &Spacing3, direction: &Direction3) -> Matrix4<f64> {
    let mut affine = Matrix4::identity();
    for r in 0..3 {
        for c in 0..3 {
            affine[(r, c)] = direction[(r, c)] * spacing[c];
        }
        affine[(r, 3)] = origin[r];
    }
    affine
}

/// Wrap an `(x, y, z)`-ordered volume and its affine as a physical image.
pub fn to_image<B: Backend>(
    data: Tensor<B, 3>,
    affine: &Matrix4<f64>,
) -> Result<Image<B, 3>, GeometryError> {
    let (origin, spacing, direction) = decompose(affine)?;
    Ok(Image::new(data.permute([2, 1, 0]), origin, spacing, direction))
}

/// Extract the voxel data of an image back into `(x, y, z)` order.
///
/// Exact inverse of [`to_image`] for the array data. The image geometry is
/// not folded back into an affine here; use [`image_affine`] for that.
pub fn to_array<B: Backend>(image: &Image<B, 3>) -> Tensor<B, 3> {
    image.data().clone().permute([2, 1, 0])
}

/// The affine corresponding to an image's current geometry.
pub fn image_affine<B: Backend>(image: &Image<B, 3>) -> Matrix4<f64> {
    compose(image.origin(), image.spacing(), image.direction())
}
