//! Rigid transform: rotation + translation about a fixed center.

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::trait_::Transform;

/// 3D rigid transform (6 degrees of freedom).
///
/// Rotation is parameterized by Euler angles `(x, y, z)` in radians with
/// `R = R_z · R_y · R_x`, applied about a fixed center `c`:
/// `T(p) = R (p - c) + c + t`.
///
/// Translation and rotation are optimizable parameters; the center is held
/// fixed. The registration engine treats instances as immutable inputs and
/// builds updated copies via [`RigidTransform::with_params`].
#[derive(Module, Debug)]
pub struct RigidTransform<B: Backend> {
    translation: Param<Tensor<B, 1>>,
    rotation: Param<Tensor<B, 1>>,
    center: Tensor<B, 1>,
}

impl<B: Backend> RigidTransform<B> {
    /// Create a transform from `[3]` translation, `[3]` Euler angles, and a
    /// `[3]` center of rotation.
    pub fn new(translation: Tensor<B, 1>, rotation: Tensor<B, 1>, center: Tensor<B, 1>) -> Self {
        Self {
            translation: Param::from_tensor(translation),
            rotation: Param::from_tensor(rotation),
            center,
        }
    }

    /// Identity transform about the given center (origin if `None`).
    pub fn identity(center: Option<Tensor<B, 1>>, device: &B::Device) -> Self {
        let translation = Tensor::zeros([3], device);
        let rotation = Tensor::zeros([3], device);
        let center = center.unwrap_or_else(|| Tensor::zeros([3], device));
        Self::new(translation, rotation, center)
    }

    /// Build a transform from plain parameter values.
    pub fn from_params(
        translation: [f64; 3],
        rotation: [f64; 3],
        center: [f64; 3],
        device: &B::Device,
    ) -> Self {
        let as_f32 = |v: [f64; 3]| [v[0] as f32, v[1] as f32, v[2] as f32];
        Self::new(
            Tensor::from_floats(as_f32(translation), device),
            Tensor::from_floats(as_f32(rotation), device),
            Tensor::from_floats(as_f32(center), device),
        )
    }

    /// A copy with new translation/rotation values and the same center.
    pub fn with_params(&self, translation: [f64; 3], rotation: [f64; 3]) -> Self {
        let device = self.center.device();
        let as_f32 = |v: [f64; 3]| [v[0] as f32, v[1] as f32, v[2] as f32];
        Self::new(
            Tensor::from_floats(as_f32(translation), &device),
            Tensor::from_floats(as_f32(rotation), &device),
            self.center.clone(),
        )
    }

    pub fn translation(&self) -> Tensor<B, 1> {
        self.translation.val()
    }

    pub fn rotation(&self) -> Tensor<B, 1> {
        self.rotation.val()
    }

    pub fn center(&self) -> Tensor<B, 1> {
        self.center.clone()
    }

    /// Read back `(translation, rotation, center)` as plain values.
    pub fn params(&self) -> ([f64; 3], [f64; 3], [f64; 3]) {
        let read = |tensor: Tensor<B, 1>| -> [f64; 3] {
            let data = tensor.into_data();
            let slice = data.as_slice::<f32>().expect("parameter tensor is f32");
            [slice[0] as f64, slice[1] as f64, slice[2] as f64]
        };
        (
            read(self.translation.val()),
            read(self.rotation.val()),
            read(self.center.clone()),
        )
    }

    /// Rotation matrix `R_z · R_y · R_x` from the Euler angles.
    fn rotation_matrix(&self) -> Tensor<B, 2> {
        let r = self.rotation.val();
        let alpha = r.clone().slice([0..1]);
        let beta = r.clone().slice([1..2]);
        let gamma = r.slice([2..3]);

        let cx = alpha.clone().cos();
        let sx = alpha.sin();
        let cy = beta.clone().cos();
        let sy = beta.sin();
        let cz = gamma.clone().cos();
        let sz = gamma.sin();

        let r11 = cz.clone().mul(cy.clone());
        let r12 = cz
            .clone()
            .mul(sy.clone())
            .mul(sx.clone())
            .sub(sz.clone().mul(cx.clone()));
        let r13 = cz
            .clone()
            .mul(sy.clone())
            .mul(cx.clone())
            .add(sz.clone().mul(sx.clone()));

        let r21 = sz.clone().mul(cy.clone());
        let r22 = sz
            .clone()
            .mul(sy.clone())
            .mul(sx.clone())
            .add(cz.clone().mul(cx.clone()));
        let r23 = sz.mul(sy.clone()).mul(cx.clone()).sub(cz.mul(sx.clone()));

        let r31 = sy.neg();
        let r32 = cy.clone().mul(sx);
        let r33 = cy.mul(cx);

        let row1 = Tensor::cat(vec![r11, r12, r13], 0).reshape([1, 3]);
        let row2 = Tensor::cat(vec![r21, r22, r23], 0).reshape([1, 3]);
        let row3 = Tensor::cat(vec![r31, r32, r33], 0).reshape([1, 3]);

        Tensor::cat(vec![row1, row2, row3], 0)
    }
}

impl<B: Backend> Transform<B> for RigidTransform<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        // Row-vector form: y = (p - c) @ Rᵀ + c + t
        let r = self.rotation_matrix();
        let t = self.translation.val().reshape([1, 3]);
        let c = self.center.clone().reshape([1, 3]);

        let centered = points - c.clone();
        let rotated = centered.matmul(r.transpose());
        rotated + c + t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_pure_translation() {
        let device = Default::default();
        let transform = RigidTransform::<B>::from_params(
            [1.0, 2.0, 3.0],
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            &device,
        );

        let points = Tensor::<B, 2>::from_floats([[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]], &device);
        let out = transform.transform_points(points);
        let out = out.into_data();
        let values = out.as_slice::<f32>().unwrap();
        assert_eq!(&values[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&values[3..6], &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rotation_about_z() {
        let device = Default::default();
        let transform = RigidTransform::<B>::from_params(
            [0.0, 0.0, 0.0],
            [0.0, 0.0, std::f64::consts::FRAC_PI_2],
            [0.0, 0.0, 0.0],
            &device,
        );

        // (1, 0, 0) -> (0, 1, 0)
        let points = Tensor::<B, 2>::from_floats([[1.0, 0.0, 0.0]], &device);
        let out = transform.transform_points(points);
        let out = out.into_data();
        let values = out.as_slice::<f32>().unwrap();
        assert!((values[0] - 0.0).abs() < 1e-6);
        assert!((values[1] - 1.0).abs() < 1e-6);
        assert!((values[2] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_about_offset_center() {
        let device = Default::default();
        let transform = RigidTransform::<B>::from_params(
            [0.0, 0.0, 0.0],
            [0.0, 0.0, std::f64::consts::PI],
            [1.0, 1.0, 0.0],
            &device,
        );

        // (2, 1, 0) rotated 180 degrees about (1, 1, 0) -> (0, 1, 0)
        let points = Tensor::<B, 2>::from_floats([[2.0, 1.0, 0.0]], &device);
        let out = transform.transform_points(points);
        let out = out.into_data();
        let values = out.as_slice::<f32>().unwrap();
        assert!((values[0] - 0.0).abs() < 1e-5);
        assert!((values[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_with_params_keeps_center() {
        let device = Default::default();
        let base = RigidTransform::<B>::from_params(
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [5.0, 6.0, 7.0],
            &device,
        );
        let updated = base.with_params([1.0, 0.0, 0.0], [0.0, 0.1, 0.0]);
        let (t, r, c) = updated.params();
        assert!((t[0] - 1.0).abs() < 1e-6);
        assert!((r[1] - 0.1).abs() < 1e-6);
        assert_eq!(c, [5.0, 6.0, 7.0]);

        // The source transform is untouched.
        let (t0, r0, _) = base.params();
        assert_eq!(t0, [0.0, 0.0, 0.0]);
        assert_eq!(r0, [0.0, 0.0, 0.0]);
    }
}
