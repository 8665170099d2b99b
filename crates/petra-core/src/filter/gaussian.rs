//! Separable Gaussian smoothing.

use burn::tensor::backend::Backend;
use burn::tensor::module::conv1d;
use burn::tensor::ops::ConvOptions;
use burn::tensor::Tensor;

use crate::image::Image;
use crate::spatial::Spacing;

/// Largest half-width of the sampled kernel, in voxels.
const MAX_KERNEL_RADIUS: usize = 15;

/// Gaussian smoothing filter with sigma given in physical units (mm).
///
/// Applied as three separable 1D convolutions; the voxel-space kernel width
/// follows from sigma divided by the image spacing on each axis.
pub struct GaussianFilter {
    sigma: f64,
}

impl GaussianFilter {
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }

    pub fn apply<B: Backend>(&self, image: &Image<B, 3>) -> Image<B, 3> {
        if self.sigma <= 1e-6 {
            return image.clone();
        }

        let mut data = image.data().clone();
        let device = data.device();

        for dim in 0..3 {
            // Data axes are (z, y, x); spacing axes are (x, y, z).
            let voxel_sigma = self.sigma / image.spacing()[2 - dim];
            let radius = ((3.0 * voxel_sigma).ceil() as usize).clamp(1, MAX_KERNEL_RADIUS);
            let kernel = gaussian_kernel(voxel_sigma, radius);
            let kernel = Tensor::<B, 1>::from_floats(kernel.as_slice(), &device);
            data = convolve_axis(data, kernel, dim);
        }

        image.with_data(data)
    }
}

fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    let mut sum = 0.0;
    let two_sigma2 = 2.0 * sigma * sigma;
    for i in 0..=(2 * radius) {
        let x = i as f64 - radius as f64;
        let value = (-x * x / two_sigma2).exp();
        kernel.push(value as f32);
        sum += value;
    }
    for value in &mut kernel {
        *value /= sum as f32;
    }
    kernel
}

/// Convolve along one axis of a `[Z, Y, X]` volume.
fn convolve_axis<B: Backend>(input: Tensor<B, 3>, kernel: Tensor<B, 1>, dim: usize) -> Tensor<B, 3> {
    let dims = input.dims();

    // Move the target axis last, flatten the rest into a batch.
    let permutation: [isize; 3] = match dim {
        0 => [1, 2, 0],
        1 => [0, 2, 1],
        _ => [0, 1, 2],
    };
    let inverse: [isize; 3] = match dim {
        0 => [2, 0, 1],
        1 => [0, 2, 1],
        _ => [0, 1, 2],
    };

    let length = dims[dim];
    let batch = dims[0] * dims[1] * dims[2] / length;

    let permuted = input.permute(permutation);
    let permuted_dims = permuted.dims();
    let reshaped = permuted.reshape([batch, 1, length]);

    let kernel_size = kernel.dims()[0];
    let kernel = kernel.reshape([1, 1, kernel_size]);
    let padding = kernel_size / 2;

    let options = ConvOptions::new([1], [padding], [1], 1);
    let convolved = conv1d(reshaped, kernel, None, options);

    convolved.reshape(permuted_dims).permute(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Direction, Point};
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn impulse_image(spacing: Spacing<3>) -> Image<B, 3> {
        let device = Default::default();
        let mut values = vec![0.0f32; 7 * 7 * 7];
        values[3 * 49 + 3 * 7 + 3] = 1.0;
        let data = Tensor::<B, 3>::from_data(TensorData::new(values, [7, 7, 7]), &device);
        Image::new(data, Point::origin(), spacing, Direction::identity())
    }

    #[test]
    fn test_kernel_is_normalized() {
        let kernel = gaussian_kernel(1.0, 3);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(kernel.len(), 7);
    }

    #[test]
    fn test_smoothing_preserves_mass_and_spreads() {
        let image = impulse_image(Spacing::uniform(1.0));
        let smoothed = GaussianFilter::new(1.0).apply(&image);

        let data = smoothed.data().clone().into_data();
        let values = data.as_slice::<f32>().unwrap();
        let total: f32 = values.iter().sum();
        assert!((total - 1.0).abs() < 1e-3);

        let center = values[3 * 49 + 3 * 7 + 3];
        let neighbor = values[3 * 49 + 3 * 7 + 4];
        assert!(center < 1.0);
        assert!(neighbor > 0.0);
        assert!(center > neighbor);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let image = impulse_image(Spacing::uniform(1.0));
        let smoothed = GaussianFilter::new(0.0).apply(&image);
        let a = image.data().clone().into_data();
        let b = smoothed.data().clone().into_data();
        assert_eq!(a.as_slice::<f32>().unwrap(), b.as_slice::<f32>().unwrap());
    }

    #[test]
    fn test_physical_sigma_respects_spacing() {
        // With 2 mm voxels a 1 mm sigma spreads half as far in voxel space
        // as with 1 mm voxels.
        let coarse = GaussianFilter::new(1.0).apply(&impulse_image(Spacing::uniform(2.0)));
        let fine = GaussianFilter::new(1.0).apply(&impulse_image(Spacing::uniform(1.0)));

        let coarse_data = coarse.data().clone().into_data();
        let fine_data = fine.data().clone().into_data();
        let center = 3 * 49 + 3 * 7 + 3;
        assert!(
            coarse_data.as_slice::<f32>().unwrap()[center]
                > fine_data.as_slice::<f32>().unwrap()[center]
        );
    }
}
