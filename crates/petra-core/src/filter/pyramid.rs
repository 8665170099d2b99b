//! Multi-resolution image pyramid for coarse-to-fine registration.

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use super::downsample::DownsampleFilter;
use super::gaussian::GaussianFilter;
use crate::image::Image;

/// One pyramid level: decimation factor plus smoothing sigma.
///
/// The sigma is in physical units (mm), not voxels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PyramidLevel {
    pub shrink: usize,
    pub sigma: f64,
}

impl PyramidLevel {
    pub fn new(shrink: usize, sigma: f64) -> Self {
        Self { shrink, sigma }
    }
}

/// Precomputed image pyramid, ordered coarsest to finest.
pub struct ImagePyramid<B: Backend> {
    levels: Vec<Image<B, 3>>,
}

impl<B: Backend> ImagePyramid<B> {
    pub fn new(input: &Image<B, 3>, schedule: &[PyramidLevel]) -> Self {
        let mut levels = Vec::with_capacity(schedule.len());
        for level in schedule {
            let is_identity = level.shrink <= 1 && level.sigma <= 1e-6;
            if is_identity {
                levels.push(input.clone());
                continue;
            }

            let smoothed = GaussianFilter::new(level.sigma).apply(input);
            levels.push(DownsampleFilter::new(level.shrink).apply(&smoothed));
        }
        Self { levels }
    }

    pub fn level(&self, index: usize) -> &Image<B, 3> {
        &self.levels[index]
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }
}
