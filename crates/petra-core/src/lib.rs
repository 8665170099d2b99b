pub mod affine;
pub mod error;
pub mod filter;
pub mod image;
pub mod interpolation;
pub mod orient;
pub mod spatial;
pub mod transform;

pub use error::{GeometryError, ResampleError};
pub use image::Image;
pub use spatial::{Direction, Point, Spacing, Vector};
