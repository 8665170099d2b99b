//! Mutual-information metric with Parzen-window histogram estimation.

use std::cell::RefCell;

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Shape, Tensor, TensorData};
use petra_core::image::Image;
use petra_core::interpolation::{Interpolator, LinearInterpolator};
use petra_core::transform::Transform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::trait_::Metric;

/// Mutual information between a fixed and a moving image.
///
/// `MI(F, M) = H(F) + H(M) - H(F, M)`, estimated from smoothed (Parzen)
/// histograms over a random subset of fixed-image voxels so the estimate
/// stays differentiable with respect to the transform parameters. The loss
/// is the negated mutual information.
///
/// Intensities are rescaled into histogram-bin coordinates per evaluation,
/// which makes the metric insensitive to the absolute intensity ranges of
/// the two modalities. The sample set is redrawn every evaluation.
pub struct MattesMutualInformation {
    num_bins: usize,
    sampling_fraction: f64,
    interpolator: LinearInterpolator,
    rng: RefCell<StdRng>,
}

/// Parzen kernel width in units of one histogram bin.
const KERNEL_WIDTH: f64 = 1.0;

const EPS: f64 = 1e-10;

impl MattesMutualInformation {
    /// Create a metric with the given histogram bin count and the fraction
    /// of fixed voxels to sample per evaluation.
    pub fn new(num_bins: usize, sampling_fraction: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            num_bins,
            sampling_fraction,
            interpolator: LinearInterpolator::new(),
            rng: RefCell::new(rng),
        }
    }

    /// Draw the random voxel sample for one evaluation.
    ///
    /// Returns the flat indices into the `[Z, Y, X]` data and the matching
    /// `(x, y, z)` index triples.
    fn draw_sample(&self, shape: [usize; 3]) -> (Vec<i32>, Vec<f32>) {
        let (nz, ny, nx) = (shape[0], shape[1], shape[2]);
        let total = nz * ny * nx;
        let count = ((total as f64 * self.sampling_fraction).round() as usize).clamp(1, total);

        let mut rng = self.rng.borrow_mut();
        let mut flat = Vec::with_capacity(count);
        let mut coords = Vec::with_capacity(count * 3);
        for _ in 0..count {
            let index = rng.random_range(0..total);
            flat.push(index as i32);
            let z = index / (ny * nx);
            let rest = index % (ny * nx);
            let y = rest / nx;
            let x = rest % nx;
            coords.push(x as f32);
            coords.push(y as f32);
            coords.push(z as f32);
        }
        (flat, coords)
    }

    /// Rescale values into `[0, bins - 1]` histogram coordinates.
    fn to_bin_space<B: Backend>(values: Tensor<B, 1>, num_bins: usize) -> Tensor<B, 1> {
        let min = values.clone().min().reshape([1]);
        let max = values.clone().max().reshape([1]);
        let range = max - min.clone() + EPS;
        let normalized = (values - min) / range;
        normalized * ((num_bins - 1) as f64)
    }

    /// Smoothed histogram of bin-space values: `[num_bins]`, sums to one.
    fn histogram<B: Backend>(values: Tensor<B, 1>, bins: Tensor<B, 1>) -> Tensor<B, 1> {
        let weights = Self::kernel_weights(values, bins);
        let histogram = weights.sum_dim(0);
        let num_bins = histogram.dims()[1];
        let histogram = histogram.reshape([num_bins]);
        let total = histogram.clone().sum() + EPS;
        histogram / total
    }

    /// Smoothed joint histogram: `[num_bins, num_bins]`, sums to one.
    ///
    /// Entry `(i, j)` is `Σₖ wa(k, i) · wb(k, j)`, i.e. `Waᵀ · Wb`.
    fn joint_histogram<B: Backend>(
        values_a: Tensor<B, 1>,
        values_b: Tensor<B, 1>,
        bins: Tensor<B, 1>,
    ) -> Tensor<B, 2> {
        let weights_a = Self::kernel_weights(values_a, bins.clone());
        let weights_b = Self::kernel_weights(values_b, bins);
        let joint = weights_a.transpose().matmul(weights_b);
        let total = joint.clone().sum() + EPS;
        joint / total.reshape([1, 1])
    }

    /// Gaussian kernel responses of each value against each bin center:
    /// `[N, num_bins]`.
    fn kernel_weights<B: Backend>(values: Tensor<B, 1>, bins: Tensor<B, 1>) -> Tensor<B, 2> {
        let n = values.dims()[0];
        let num_bins = bins.dims()[0];
        let diff = values.reshape([n, 1]) - bins.reshape([1, num_bins]);
        let exponent = diff.powf_scalar(2.0) * (-0.5 / (KERNEL_WIDTH * KERNEL_WIDTH));
        exponent.exp()
    }

    fn entropy<B: Backend, const D: usize>(probabilities: Tensor<B, D>) -> Tensor<B, 1> {
        let log = (probabilities.clone() + EPS).log();
        (probabilities * log).sum().neg().reshape([1])
    }
}

impl<B: Backend> Metric<B> for MattesMutualInformation {
    fn loss(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
        transform: &impl Transform<B>,
    ) -> Tensor<B, 1> {
        let device = fixed.data().device();
        let shape = fixed.shape();
        let total = fixed.num_voxels();

        // 1. Random sample of the fixed grid.
        let (flat, coords) = self.draw_sample(shape);
        let count = flat.len();
        let flat_indices = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &device);
        let sample_indices = Tensor::<B, 1>::from_data(
            TensorData::new(coords, Shape::new([count * 3])),
            &device,
        )
        .reshape([count, 3]);

        let fixed_values = fixed.data().clone().reshape([total]).gather(0, flat_indices);

        // 2. Map sample points into the moving image and interpolate.
        let fixed_points = fixed.index_to_world_batch(sample_indices);
        let moving_points = transform.transform_points(fixed_points);
        let moving_indices = moving.world_to_index_batch(moving_points);
        let moving_values = self.interpolator.sample(moving.data(), moving_indices);

        // 3. Histograms in bin space.
        let bins = Tensor::<B, 1, Int>::arange(0..self.num_bins as i64, &device).float();
        let fixed_bins = Self::to_bin_space(fixed_values, self.num_bins);
        let moving_bins = Self::to_bin_space(moving_values, self.num_bins);

        let h_fixed = Self::entropy(Self::histogram(fixed_bins.clone(), bins.clone()));
        let h_moving = Self::entropy(Self::histogram(moving_bins.clone(), bins.clone()));
        let h_joint = Self::entropy(Self::joint_histogram(fixed_bins, moving_bins, bins));

        // Loss = -MI = H(F, M) - H(F) - H(M)
        h_joint - h_fixed - h_moving
    }

    fn name(&self) -> &'static str {
        "MattesMutualInformation"
    }
}

impl Clone for MattesMutualInformation {
    fn clone(&self) -> Self {
        Self {
            num_bins: self.num_bins,
            sampling_fraction: self.sampling_fraction,
            interpolator: self.interpolator,
            rng: RefCell::new(self.rng.borrow().clone()),
        }
    }
}
