//! Foreground bounding-box cropping.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};
use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};

/// Axis-aligned box over `(x, y, z)` voxel indices; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub start: [usize; 3],
    pub end: [usize; 3],
}

impl CropBox {
    pub fn size(&self) -> [usize; 3] {
        [
            self.end[0] - self.start[0],
            self.end[1] - self.start[1],
            self.end[2] - self.start[2],
        ]
    }
}

/// Bounding box of voxels above `threshold_fraction` of the volume maximum.
///
/// Returns `None` when nothing clears the threshold. The default fraction
/// used by the pipeline is 0.1; it is a heuristic and deliberately kept as
/// a parameter.
pub fn foreground_box<B: Backend>(
    volume: &Tensor<B, 3>,
    threshold_fraction: f64,
) -> Option<CropBox> {
    let [nx, ny, nz] = volume.dims();

    let max: f32 = volume.clone().max().into_scalar().elem();
    let threshold = (threshold_fraction as f32) * max;

    let data = volume.clone().into_data();
    let values = data.as_slice::<f32>().ok()?;

    let mut start = [nx, ny, nz];
    let mut end = [0usize; 3];
    let mut any = false;

    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                if values[x * ny * nz + y * nz + z] > threshold {
                    any = true;
                    let voxel = [x, y, z];
                    for axis in 0..3 {
                        start[axis] = start[axis].min(voxel[axis]);
                        end[axis] = end[axis].max(voxel[axis] + 1);
                    }
                }
            }
        }
    }

    any.then_some(CropBox { start, end })
}

/// Slice a volume to a crop box.
pub fn crop<B: Backend>(volume: &Tensor<B, 3>, bbox: &CropBox) -> Tensor<B, 3> {
    volume.clone().slice([
        bbox.start[0]..bbox.end[0],
        bbox.start[1]..bbox.end[1],
        bbox.start[2]..bbox.end[2],
    ])
}

/// Affine of the cropped volume: same orientation, origin moved to the
/// physical position of the box start.
pub fn crop_affine(affine: &Matrix4<f64>, bbox: &CropBox) -> Matrix4<f64> {
    let corner = Vector4::new(
        bbox.start[0] as f64,
        bbox.start[1] as f64,
        bbox.start[2] as f64,
        1.0,
    );
    let origin = affine * corner;

    let mut cropped = *affine;
    for r in 0..3 {
        cropped[(r, 3)] = origin[r];
    }
    cropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn boxed_volume() -> Tensor<B, 3> {
        // 8x8x8 zeros with a bright 2x3x1 region at (2..4, 1..4, 5..6).
        let device = Default::default();
        let mut values = vec![0.0f32; 512];
        for x in 2..4 {
            for y in 1..4 {
                values[x * 64 + y * 8 + 5] = 10.0;
            }
        }
        Tensor::from_data(TensorData::new(values, [8, 8, 8]), &device)
    }

    #[test]
    fn test_foreground_box_bounds() {
        let bbox = foreground_box(&boxed_volume(), 0.1).unwrap();
        assert_eq!(bbox.start, [2, 1, 5]);
        assert_eq!(bbox.end, [4, 4, 6]);
        assert_eq!(bbox.size(), [2, 3, 1]);
    }

    #[test]
    fn test_all_background_returns_none() {
        let device = Default::default();
        let volume = Tensor::<B, 3>::zeros([4, 4, 4], &device);
        assert!(foreground_box(&volume, 0.1).is_none());
    }

    #[test]
    fn test_crop_extracts_bright_region() {
        let volume = boxed_volume();
        let bbox = foreground_box(&volume, 0.1).unwrap();
        let cropped = crop(&volume, &bbox);
        assert_eq!(cropped.dims(), [2, 3, 1]);
        let data = cropped.into_data();
        assert!(data.as_slice::<f32>().unwrap().iter().all(|&v| v == 10.0));
    }

    #[test]
    fn test_crop_affine_moves_origin() {
        let mut affine = Matrix4::identity() * 2.0;
        affine[(3, 3)] = 1.0;
        affine[(0, 3)] = 1.0;

        let bbox = CropBox {
            start: [2, 1, 5],
            end: [4, 4, 6],
        };
        let cropped = crop_affine(&affine, &bbox);

        // origin' = affine * (2, 1, 5, 1)
        assert!((cropped[(0, 3)] - 5.0).abs() < 1e-12);
        assert!((cropped[(1, 3)] - 2.0).abs() < 1e-12);
        assert!((cropped[(2, 3)] - 10.0).abs() < 1e-12);
        // Linear part untouched.
        assert!((cropped[(0, 0)] - 2.0).abs() < 1e-12);
    }
}
