//! Trilinear interpolation.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use super::trait_::Interpolator;

/// Trilinear interpolator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn gather<B: Backend>(
        flat: &Tensor<B, 1>,
        xi: &Tensor<B, 1, Int>,
        yi: &Tensor<B, 1, Int>,
        zi: &Tensor<B, 1, Int>,
        stride_y: i32,
        stride_z: i32,
    ) -> Tensor<B, 1> {
        let idx = zi.clone() * stride_z + yi.clone() * stride_y + xi.clone();
        flat.clone().gather(0, idx)
    }
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn sample(&self, data: &Tensor<B, 3>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [nz, ny, nx] = data.dims();
        let batch = indices.dims()[0];
        let device = indices.device();

        // indices: [N, 3] columns are (x, y, z)
        let x = indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let y = indices.clone().narrow(1, 1, 1).squeeze::<1>(1);
        let z = indices.narrow(1, 2, 1).squeeze::<1>(1);

        let x0 = x.clone().floor();
        let y0 = y.clone().floor();
        let z0 = z.clone().floor();

        let wx = x - x0.clone();
        let wy = y - y0.clone();
        let wz = z - z0.clone();

        let x1 = x0.clone() + 1.0;
        let y1 = y0.clone() + 1.0;
        let z1 = z0.clone() + 1.0;

        let x0_i = x0.clamp(0.0, (nx - 1) as f64).int();
        let y0_i = y0.clamp(0.0, (ny - 1) as f64).int();
        let z0_i = z0.clamp(0.0, (nz - 1) as f64).int();
        let x1_i = x1.clamp(0.0, (nx - 1) as f64).int();
        let y1_i = y1.clamp(0.0, (ny - 1) as f64).int();
        let z1_i = z1.clamp(0.0, (nz - 1) as f64).int();

        // Strides for the [Z, Y, X] layout
        let stride_z = (ny * nx) as i32;
        let stride_y = nx as i32;

        let flat = data.clone().reshape([nz * ny * nx]);

        let v000 = Self::gather(&flat, &x0_i, &y0_i, &z0_i, stride_y, stride_z);
        let v001 = Self::gather(&flat, &x0_i, &y0_i, &z1_i, stride_y, stride_z);
        let v010 = Self::gather(&flat, &x0_i, &y1_i, &z0_i, stride_y, stride_z);
        let v011 = Self::gather(&flat, &x0_i, &y1_i, &z1_i, stride_y, stride_z);
        let v100 = Self::gather(&flat, &x1_i, &y0_i, &z0_i, stride_y, stride_z);
        let v101 = Self::gather(&flat, &x1_i, &y0_i, &z1_i, stride_y, stride_z);
        let v110 = Self::gather(&flat, &x1_i, &y1_i, &z0_i, stride_y, stride_z);
        let v111 = Self::gather(&flat, &x1_i, &y1_i, &z1_i, stride_y, stride_z);

        let one = Tensor::<B, 1>::ones([batch], &device);
        let inv_wx = one.clone() - wx.clone();
        let inv_wy = one.clone() - wy.clone();
        let inv_wz = one - wz.clone();

        // Collapse along x, then y, then z.
        let c00 = v000 * inv_wx.clone() + v100 * wx.clone();
        let c01 = v001 * inv_wx.clone() + v101 * wx.clone();
        let c10 = v010 * inv_wx.clone() + v110 * wx.clone();
        let c11 = v011 * inv_wx + v111 * wx;

        let c0 = c00 * inv_wy.clone() + c10 * wy.clone();
        let c1 = c01 * inv_wy + c11 * wy;

        c0 * inv_wz + c1 * wz
    }
}
