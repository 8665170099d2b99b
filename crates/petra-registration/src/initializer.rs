//! Moment-based transform initialization.

use burn::tensor::backend::Backend;
use petra_core::image::{index_grid_3d, Image};
use petra_core::spatial::Point3;
use petra_core::transform::RigidTransform;

/// Intensity-weighted center of mass, in physical coordinates.
///
/// Falls back to the geometric center when the image has (near-)zero total
/// intensity.
pub fn center_of_mass<B: Backend>(image: &Image<B, 3>) -> Point3 {
    let device = image.data().device();
    let shape = image.shape();
    let total_voxels = image.num_voxels();

    let weights = image.data().clone().reshape([total_voxels]);
    let total = {
        let sum = weights.clone().sum().into_data();
        sum.as_slice::<f32>().expect("intensity sum is f32")[0] as f64
    };
    if total.abs() < 1e-12 {
        return image.center();
    }

    let grid = index_grid_3d::<B>(shape, &device);
    let weighted = grid * weights.reshape([total_voxels, 1]);
    let summed = weighted.sum_dim(0).reshape([3]);
    let data = summed.into_data();
    let sums = data.as_slice::<f32>().expect("moment sums are f32");

    let index = Point3::new([
        sums[0] as f64 / total,
        sums[1] as f64 / total,
        sums[2] as f64 / total,
    ]);
    image.index_to_world(&index)
}

/// Initial rigid transform aligning the two images' centers of mass.
///
/// Zero rotation about the fixed image's center of mass, translation set to
/// the offset between the two mass centers. Mirrors the classic moments
/// initializer used ahead of iterative registration.
pub fn moments_initializer<B: Backend>(
    fixed: &Image<B, 3>,
    moving: &Image<B, 3>,
) -> RigidTransform<B> {
    let fixed_com = center_of_mass(fixed);
    let moving_com = center_of_mass(moving);
    let offset = moving_com - fixed_com;

    let device = fixed.data().device();
    RigidTransform::from_params(
        [offset[0], offset[1], offset[2]],
        [0.0, 0.0, 0.0],
        [fixed_com[0], fixed_com[1], fixed_com[2]],
        &device,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::{Tensor, TensorData};
    use burn_ndarray::NdArray;
    use petra_core::spatial::{Direction, Point, Spacing};

    type B = NdArray<f32>;

    fn blob_image(center: [usize; 3], size: usize) -> Image<B, 3> {
        let device = Default::default();
        let mut values = vec![0.0f32; size * size * size];
        values[center[2] * size * size + center[1] * size + center[0]] = 1.0;
        let data = Tensor::<B, 3>::from_data(TensorData::new(values, [size, size, size]), &device);
        Image::new(
            data,
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
        )
    }

    #[test]
    fn test_center_of_mass_of_point_source() {
        let image = blob_image([2, 5, 7], 10);
        let com = center_of_mass(&image);
        assert!((com[0] - 2.0).abs() < 1e-5);
        assert!((com[1] - 5.0).abs() < 1e-5);
        assert!((com[2] - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_image_falls_back_to_geometric_center() {
        let device = Default::default();
        let data = Tensor::<B, 3>::zeros([5, 5, 5], &device);
        let image = Image::new(
            data,
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
        );
        let com = center_of_mass(&image);
        for i in 0..3 {
            assert!((com[i] - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_initializer_translation_matches_offset() {
        let fixed = blob_image([3, 3, 3], 10);
        let moving = blob_image([5, 4, 6], 10);

        let transform = moments_initializer(&fixed, &moving);
        let (translation, rotation, center) = transform.params();

        assert!((translation[0] - 2.0).abs() < 1e-4);
        assert!((translation[1] - 1.0).abs() < 1e-4);
        assert!((translation[2] - 3.0).abs() < 1e-4);
        assert_eq!(rotation, [0.0, 0.0, 0.0]);
        assert!((center[0] - 3.0).abs() < 1e-4);
    }
}
