//! NIfTI reading and writing.
//!
//! Volumes are exchanged as `(x, y, z)`-ordered tensors plus a 4×4 affine.
//! Reading canonicalizes the orientation so callers always see volumes in
//! the closest-canonical axis convention.

use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use nalgebra::Matrix4;
use ndarray::Array3;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use petra_core::orient::closest_canonical;
use std::path::Path;

/// Affine from a NIfTI header: sform when present, qform as fallback,
/// plain pixdim scaling otherwise.
fn header_affine(header: &NiftiHeader) -> Matrix4<f64> {
    if header.sform_code > 0 {
        let rows = [header.srow_x, header.srow_y, header.srow_z];
        let mut affine = Matrix4::identity();
        for (r, row) in rows.iter().enumerate() {
            for c in 0..4 {
                affine[(r, c)] = row[c] as f64;
            }
        }
        return affine;
    }

    if header.qform_code > 0 {
        // Quaternion form per the NIfTI-1 standard.
        let b = header.quatern_b as f64;
        let c = header.quatern_c as f64;
        let d = header.quatern_d as f64;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

        let qfac = if header.pixdim[0] == 0.0 {
            1.0
        } else {
            header.pixdim[0] as f64
        };

        let r = [
            [
                a * a + b * b - c * c - d * d,
                2.0 * b * c - 2.0 * a * d,
                2.0 * b * d + 2.0 * a * c,
            ],
            [
                2.0 * b * c + 2.0 * a * d,
                a * a + c * c - b * b - d * d,
                2.0 * c * d - 2.0 * a * b,
            ],
            [
                2.0 * b * d - 2.0 * a * c,
                2.0 * c * d + 2.0 * a * b,
                a * a + d * d - c * c - b * b,
            ],
        ];

        let scale = [
            header.pixdim[1] as f64,
            header.pixdim[2] as f64,
            header.pixdim[3] as f64 * qfac,
        ];
        let offset = [
            header.quatern_x as f64,
            header.quatern_y as f64,
            header.quatern_z as f64,
        ];

        let mut affine = Matrix4::identity();
        for row in 0..3 {
            for col in 0..3 {
                affine[(row, col)] = r[row][col] * scale[col];
            }
            affine[(row, 3)] = offset[row];
        }
        return affine;
    }

    let mut affine = Matrix4::identity();
    for axis in 0..3 {
        affine[(axis, axis)] = header.pixdim[axis + 1] as f64;
    }
    affine
}

/// Read a 3D NIfTI volume as an `(x, y, z)`-ordered tensor plus affine.
///
/// The volume is reoriented to the closest canonical axes before being
/// returned; the affine reflects the reoriented grid. Non-3D files are
/// rejected before any numerical work.
pub fn read_volume<B: Backend, P: AsRef<Path>>(
    path: P,
    device: &B::Device,
) -> Result<(Tensor<B, 3>, Matrix4<f64>)> {
    let path = path.as_ref();
    let object = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("failed to read NIfTI file {}", path.display()))?;

    let affine = header_affine(object.header());

    let volume = object
        .into_volume()
        .into_ndarray::<f32>()
        .context("failed to decode NIfTI voxel data")?;

    let shape = volume.shape().to_vec();
    if shape.len() != 3 {
        bail!(
            "expected a 3D volume, {} has {} dimensions",
            path.display(),
            shape.len()
        );
    }
    let dims = [shape[0], shape[1], shape[2]];

    // NIfTI stores (x, y, z); flatten in that logical order.
    let values = volume.as_standard_layout().into_owned().into_raw_vec();
    let tensor = Tensor::<B, 3>::from_data(TensorData::new(values, Shape::new(dims)), device);

    tracing::debug!(path = %path.display(), ?dims, "read NIfTI volume");

    let (canonical, canonical_affine) =
        closest_canonical(tensor, &affine).context("volume affine is degenerate")?;
    Ok((canonical, canonical_affine))
}

/// Write an `(x, y, z)`-ordered volume with its affine as a NIfTI file.
///
/// The affine is stored through the sform fields of the header.
pub fn write_volume<B: Backend, P: AsRef<Path>>(
    path: P,
    volume: &Tensor<B, 3>,
    affine: &Matrix4<f64>,
) -> Result<()> {
    use nifti::writer::WriterOptions;

    let [nx, ny, nz] = volume.dims();
    let data = volume.clone().into_data();
    let values = data
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("failed to read tensor data: {e:?}"))?;

    let array = Array3::from_shape_vec((nx, ny, nz), values.to_vec())
        .context("volume shape does not match its data")?;

    let mut header = NiftiHeader::default();
    header.sform_code = 1;
    for c in 0..4 {
        header.srow_x[c] = affine[(0, c)] as f32;
        header.srow_y[c] = affine[(1, c)] as f32;
        header.srow_z[c] = affine[(2, c)] as f32;
    }

    WriterOptions::new(path.as_ref())
        .reference_header(&header)
        .write_nifti(&array)
        .map_err(|e| anyhow::anyhow!("failed to write NIfTI file: {e}"))?;

    Ok(())
}
