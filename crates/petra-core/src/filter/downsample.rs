//! Integer-factor decimation.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use crate::image::Image;

/// Keeps every Nth voxel along each axis and scales the spacing to match.
///
/// The origin is unchanged: the physical location of voxel zero does not
/// move when decimating from index zero.
pub struct DownsampleFilter {
    factor: usize,
}

impl DownsampleFilter {
    pub fn new(factor: usize) -> Self {
        Self { factor }
    }

    pub fn apply<B: Backend>(&self, image: &Image<B, 3>) -> Image<B, 3> {
        if self.factor <= 1 {
            return image.clone();
        }

        let mut data = image.data().clone();
        let device = data.device();
        let dims = image.shape();

        let mut spacing = *image.spacing();
        for dim in 0..3 {
            let kept: Vec<i32> = (0..dims[dim]).step_by(self.factor).map(|i| i as i32).collect();
            let indices = Tensor::<B, 1, Int>::from_ints(kept.as_slice(), &device);
            data = data.select(dim, indices);
            // Data axes are (z, y, x); spacing axes are (x, y, z).
            spacing[2 - dim] *= self.factor as f64;
        }

        Image::new(data, *image.origin(), spacing, *image.direction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Direction, Point, Spacing};
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_downsample_by_two() {
        let device = Default::default();
        let values: Vec<f32> = (0..64).map(|v| v as f32).collect();
        let data = Tensor::<B, 3>::from_data(TensorData::new(values, [4, 4, 4]), &device);
        let image = Image::new(
            data,
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
        );

        let down = DownsampleFilter::new(2).apply(&image);
        assert_eq!(down.shape(), [2, 2, 2]);
        assert!((down.spacing()[0] - 2.0).abs() < 1e-12);

        let data = down.data().clone().into_data();
        let values = data.as_slice::<f32>().unwrap();
        // Voxel (0,0,0) stays, next kept x voxel is original index 2.
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 2.0);
    }

    #[test]
    fn test_factor_one_is_identity() {
        let device = Default::default();
        let data = Tensor::<B, 3>::zeros([3, 3, 3], &device);
        let image = Image::new(
            data,
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
        );
        let same = DownsampleFilter::new(1).apply(&image);
        assert_eq!(same.shape(), [3, 3, 3]);
        assert_eq!(same.spacing(), image.spacing());
    }
}
