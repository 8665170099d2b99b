//! Nearest-neighbor interpolation.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::trait_::Interpolator;

/// Nearest-neighbor interpolator, for label volumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborInterpolator;

impl NearestNeighborInterpolator {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for NearestNeighborInterpolator {
    fn sample(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [nz, ny, nx] = data.dims();
        let n = indices.dims()[0];

        let x = indices.clone().slice([0..n, 0..1]).squeeze::<1>(1);
        let y = indices.clone().slice([0..n, 1..2]).squeeze::<1>(1);
        let z = indices.slice([0..n, 2..3]).squeeze::<1>(1);

        let x_i = x.round().clamp(0.0, (nx - 1) as f64).int();
        let y_i = y.round().clamp(0.0, (ny - 1) as f64).int();
        let z_i = z.round().clamp(0.0, (nz - 1) as f64).int();

        let stride_z = (ny * nx) as i32;
        let stride_y = nx as i32;

        let idx = z_i * stride_z + y_i * stride_y + x_i;
        data.clone().reshape([nz * ny * nx]).gather(0, idx)
    }
}
