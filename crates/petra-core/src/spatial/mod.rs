//! Spatial types for points, vectors, voxel spacing, and direction matrices.
//!
//! Thin wrappers around nalgebra's statically-sized types, carrying the
//! physical-space conventions used throughout petra.

pub mod direction;
pub mod point;
pub mod spacing;
pub mod vector;

pub use direction::Direction;
pub use point::Point;
pub use spacing::Spacing;
pub use vector::Vector;

pub type Point3 = Point<3>;
pub type Vector3 = Vector<3>;
pub type Spacing3 = Spacing<3>;
pub type Direction3 = Direction<3>;
