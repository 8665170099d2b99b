//! Image type with physical metadata, plus voxel-grid helpers.

pub mod grid;
pub mod image;

pub use grid::index_grid_3d;
pub use image::Image;
