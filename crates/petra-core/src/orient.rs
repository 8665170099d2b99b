//! Reorientation of volumes to the closest canonical (RAS) axes.
//!
//! Scanner volumes come in arbitrary axis orders and polarities. Downstream
//! code assumes the canonical convention: voxel axis i predominantly along
//! physical axis i, pointing in the positive direction. Reorientation is a
//! pure permutation/flip of the voxel grid with a matching affine update;
//! no interpolation is involved.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use nalgebra::Matrix4;

use crate::affine::decompose;
use crate::error::GeometryError;

/// Permute and flip a volume so its affine is as close to diagonal-positive
/// as the direction cosines allow.
///
/// Returns the reoriented `(x, y, z)`-ordered volume and its updated affine.
/// Already-canonical volumes come back unchanged (same tensor, same affine).
pub fn closest_canonical<B: Backend>(
    data: Tensor<B, 3>,
    affine: &Matrix4<f64>,
) -> Result<(Tensor<B, 3>, Matrix4<f64>), GeometryError> {
    let (_, _, direction) = decompose(affine)?;

    // For each physical axis, pick the unused voxel axis with the largest
    // absolute cosine. Greedy over descending magnitude handles oblique
    // acquisitions the same way nibabel's io_orientation does.
    let mut source = [usize::MAX; 3];
    let mut flip = [false; 3];
    let mut used = [false; 3];
    for _ in 0..3 {
        let mut best = (0usize, 0usize, -1.0f64);
        for phys in 0..3 {
            if source[phys] != usize::MAX {
                continue;
            }
            for vox in 0..3 {
                if used[vox] {
                    continue;
                }
                let magnitude = direction[(phys, vox)].abs();
                if magnitude > best.2 {
                    best = (phys, vox, magnitude);
                }
            }
        }
        let (phys, vox, _) = best;
        source[phys] = vox;
        used[vox] = true;
        flip[phys] = direction[(phys, vox)] < 0.0;
    }

    if source == [0, 1, 2] && !flip.iter().any(|&f| f) {
        return Ok((data, *affine));
    }

    let dims = data.dims();
    let mut permuted = data.permute([
        source[0] as isize,
        source[1] as isize,
        source[2] as isize,
    ]);
    for (axis, &flipped) in flip.iter().enumerate() {
        if flipped {
            permuted = permuted.flip([axis as isize]);
        }
    }

    // Affine columns follow the voxel axes: permute, negate flipped columns,
    // and shift the origin to the voxel that becomes index zero.
    let mut reoriented = Matrix4::identity();
    for (new_axis, &old_axis) in source.iter().enumerate() {
        let sign = if flip[new_axis] { -1.0 } else { 1.0 };
        for r in 0..3 {
            reoriented[(r, new_axis)] = sign * affine[(r, old_axis)];
        }
        for r in 0..3 {
            reoriented[(r, 3)] += if flip[new_axis] {
                affine[(r, old_axis)] * (dims[old_axis] as f64 - 1.0)
            } else {
                0.0
            };
        }
    }
    for r in 0..3 {
        reoriented[(r, 3)] += affine[(r, 3)];
    }

    Ok((permuted, reoriented))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::to_image;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_canonical_volume_unchanged() {
        let device = Default::default();
        let data = Tensor::<B, 3>::from_data(
            TensorData::new((0..8).map(|v| v as f32).collect::<Vec<_>>(), [2, 2, 2]),
            &device,
        );
        let affine = Matrix4::identity();
        let (out, out_affine) = closest_canonical(data.clone(), &affine).unwrap();
        assert_eq!(out_affine, affine);
        assert_eq!(
            out.into_data().as_slice::<f32>().unwrap(),
            data.into_data().as_slice::<f32>().unwrap()
        );
    }

    #[test]
    fn test_flipped_axis_is_restored() {
        let device = Default::default();
        let values: Vec<f32> = (0..4).map(|v| v as f32).collect();
        let data = Tensor::<B, 3>::from_data(TensorData::new(values, [4, 1, 1]), &device);

        // x axis stored right-to-left: column negative, origin at the far end.
        let mut affine = Matrix4::identity();
        affine[(0, 0)] = -1.0;
        affine[(0, 3)] = 3.0;

        let (out, out_affine) = closest_canonical(data, &affine).unwrap();
        assert!((out_affine[(0, 0)] - 1.0).abs() < 1e-12);
        assert!(out_affine[(0, 3)].abs() < 1e-12);
        let flipped = out.into_data();
        assert_eq!(flipped.as_slice::<f32>().unwrap(), &[3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_permuted_axes_are_restored() {
        let device = Default::default();
        // One voxel along x, three along y: stored with axes swapped.
        let values: Vec<f32> = vec![1.0, 2.0, 3.0];
        let data = Tensor::<B, 3>::from_data(TensorData::new(values, [3, 1, 1]), &device);

        // Voxel axis 0 runs along physical y.
        let mut affine = Matrix4::identity();
        affine[(0, 0)] = 0.0;
        affine[(1, 0)] = 1.0;
        affine[(0, 1)] = 1.0;
        affine[(1, 1)] = 0.0;

        let (out, out_affine) = closest_canonical(data, &affine).unwrap();
        assert_eq!(out.dims(), [1, 3, 1]);
        assert!((out_affine[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((out_affine[(1, 1)] - 1.0).abs() < 1e-12);

        // Geometry must describe the same physical samples after the swap.
        let image = to_image(out, &out_affine).unwrap();
        let p = image.index_to_world(&crate::spatial::Point3::new([0.0, 2.0, 0.0]));
        assert!((p[1] - 2.0).abs() < 1e-12);
    }
}
