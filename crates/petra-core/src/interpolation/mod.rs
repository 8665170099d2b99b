//! Interpolators for sampling volumes at continuous voxel indices.

pub mod linear;
pub mod nearest;
pub mod trait_;

pub use linear::LinearInterpolator;
pub use nearest::NearestNeighborInterpolator;
pub use trait_::Interpolator;

use serde::{Deserialize, Serialize};

/// Interpolation rule, for configuration surfaces.
///
/// Linear for intensity volumes; nearest-neighbor for label volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Linear,
    Nearest,
}
