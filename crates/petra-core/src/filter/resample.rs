//! Resampling onto a new voxel grid.
//!
//! [`ResampleFilter`] regrids an input image onto an arbitrary output grid:
//! every output voxel index is mapped to a physical point, pushed through a
//! transform into the input image's space, and sampled there. The transform
//! maps output physical space to input physical space, so for registered
//! resampling it is the fixed→moving transform itself.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::ResampleError;
use crate::image::{index_grid_3d, Image};
use crate::interpolation::{
    Interpolation, Interpolator, LinearInterpolator, NearestNeighborInterpolator,
};
use crate::spatial::{Direction, Point, Spacing};
use crate::transform::{IdentityTransform, Transform};

/// Resample filter with an explicit output grid.
pub struct ResampleFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    size: [usize; 3],
    origin: Point<3>,
    spacing: Spacing<3>,
    direction: Direction<3>,
    transform: T,
    interpolator: I,
    default_value: f64,
    _backend: std::marker::PhantomData<B>,
}

impl<B, T, I> ResampleFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    /// Output grid given explicitly. `size` is in data order `[Z, Y, X]`.
    pub fn new(
        size: [usize; 3],
        origin: Point<3>,
        spacing: Spacing<3>,
        direction: Direction<3>,
        transform: T,
        interpolator: I,
    ) -> Self {
        Self {
            size,
            origin,
            spacing,
            direction,
            transform,
            interpolator,
            default_value: 0.0,
            _backend: std::marker::PhantomData,
        }
    }

    /// Output grid copied from a reference image.
    pub fn from_reference(reference: &Image<B, 3>, transform: T, interpolator: I) -> Self {
        Self::new(
            reference.shape(),
            *reference.origin(),
            *reference.spacing(),
            *reference.direction(),
            transform,
            interpolator,
        )
    }

    /// Value assigned to output voxels that map outside the input grid.
    pub fn with_default_value(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }

    pub fn apply(&self, input: &Image<B, 3>) -> Image<B, 3> {
        let device = input.data().device();
        let [nz, ny, nx] = input.data().dims();

        // Output geometry as an image so the shared index↔world mapping
        // applies; the placeholder data is replaced below.
        let output = Image::new(
            Tensor::<B, 3>::zeros(self.size, &device),
            self.origin,
            self.spacing,
            self.direction,
        );

        let grid = index_grid_3d::<B>(self.size, &device);
        let output_points = output.index_to_world_batch(grid);
        let input_points = self.transform.transform_points(output_points);
        let input_indices = input.world_to_index_batch(input_points);

        let values = self.interpolator.sample(input.data(), input_indices.clone());

        // Zero-one mask of samples that landed inside the input grid; the
        // interpolator clamps, so outside samples must be overwritten with
        // the default value.
        let x = input_indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let y = input_indices.clone().narrow(1, 1, 1).squeeze::<1>(1);
        let z = input_indices.narrow(1, 2, 1).squeeze::<1>(1);
        let inside = axis_inside(x, nx) * axis_inside(y, ny) * axis_inside(z, nz);

        let fill = inside.clone().neg().add_scalar(1.0).mul_scalar(self.default_value);
        let masked = values * inside + fill;

        output.with_data(masked.reshape(self.size))
    }
}

/// 1 where `0 <= coordinate <= len - 1`, else 0.
fn axis_inside<B: Backend>(coordinate: Tensor<B, 1>, len: usize) -> Tensor<B, 1> {
    let upper = (len - 1) as f32;
    coordinate.clone().greater_equal_elem(0.0).float()
        * coordinate.lower_equal_elem(upper).float()
}

/// Regrid an image onto a new voxel spacing, preserving its physical extent.
///
/// The output size along each axis is `round(size · spacing / new_spacing)`;
/// origin and direction are unchanged and no co-registration is applied.
/// Asking for the spacing the image already has returns a plain clone.
pub fn resample_to_spacing<B: Backend>(
    image: &Image<B, 3>,
    new_spacing: Spacing<3>,
    interpolation: Interpolation,
) -> Result<Image<B, 3>, ResampleError> {
    for axis in 0..3 {
        if new_spacing[axis] <= 0.0 {
            return Err(ResampleError::InvalidSpacing {
                axis,
                value: new_spacing[axis],
            });
        }
    }

    if image.spacing().approx_eq(&new_spacing, 1e-9) {
        return Ok(image.clone());
    }

    // Shape is (z, y, x); spacing axes are (x, y, z).
    let shape = image.shape();
    let mut size = [0usize; 3];
    for axis in 0..3 {
        let old_size = shape[2 - axis] as f64;
        let scaled = (old_size * image.spacing()[axis] / new_spacing[axis]).round() as i64;
        if scaled <= 0 {
            return Err(ResampleError::EmptyAxis {
                axis,
                spacing: new_spacing[axis],
                size: scaled,
            });
        }
        size[2 - axis] = scaled as usize;
    }

    let resampled = match interpolation {
        Interpolation::Linear => ResampleFilter::new(
            size,
            *image.origin(),
            new_spacing,
            *image.direction(),
            IdentityTransform::new(),
            LinearInterpolator::new(),
        )
        .apply(image),
        Interpolation::Nearest => ResampleFilter::new(
            size,
            *image.origin(),
            new_spacing,
            *image.direction(),
            IdentityTransform::new(),
            NearestNeighborInterpolator::new(),
        )
        .apply(image),
    };
    Ok(resampled)
}

/// Regrid `input` onto `reference`'s exact grid through `transform`.
pub fn resample_onto<B: Backend, T: Transform<B>>(
    input: &Image<B, 3>,
    reference: &Image<B, 3>,
    transform: T,
    interpolation: Interpolation,
) -> Image<B, 3> {
    match interpolation {
        Interpolation::Linear => {
            ResampleFilter::from_reference(reference, transform, LinearInterpolator::new())
                .apply(input)
        }
        Interpolation::Nearest => {
            ResampleFilter::from_reference(reference, transform, NearestNeighborInterpolator::new())
                .apply(input)
        }
    }
}
