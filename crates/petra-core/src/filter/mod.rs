//! Image filters: smoothing, decimation, pyramids, and resampling.

pub mod downsample;
pub mod gaussian;
pub mod pyramid;
pub mod resample;

pub use downsample::DownsampleFilter;
pub use gaussian::GaussianFilter;
pub use pyramid::{ImagePyramid, PyramidLevel};
pub use resample::{resample_onto, resample_to_spacing, ResampleFilter};
