//! Immutable registration configuration.

use petra_core::filter::PyramidLevel;
use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};

/// Parameter bundle for the registration engine.
///
/// Constructed once and passed by reference into [`crate::register`]; the
/// engine never mutates it, so a single configuration can drive any number
/// of registrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Histogram bins for the mutual-information metric.
    pub histogram_bins: usize,
    /// Fraction of fixed-image voxels sampled per metric evaluation.
    pub sampling_fraction: f64,
    /// Seed for the metric's voxel sampling; `None` draws from the OS.
    pub sampling_seed: Option<u64>,
    /// Initial optimizer step length.
    pub learning_rate: f64,
    /// Iteration cap per resolution level.
    pub max_iterations: usize,
    /// Mean metric change below which the convergence window triggers.
    pub convergence_value: f64,
    /// Number of recent metric values inspected for convergence.
    pub convergence_window: usize,
    /// Coarse-to-fine schedule: shrink factors with physical-unit sigmas.
    pub pyramid: Vec<PyramidLevel>,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 50,
            sampling_fraction: 0.01,
            sampling_seed: None,
            learning_rate: 1.0,
            max_iterations: 100,
            convergence_value: 1e-6,
            convergence_window: 10,
            pyramid: vec![
                PyramidLevel::new(4, 2.0),
                PyramidLevel::new(2, 1.0),
                PyramidLevel::new(1, 0.0),
            ],
        }
    }
}

impl RegistrationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.histogram_bins < 2 {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "at least 2 histogram bins required, got {}",
                self.histogram_bins
            )));
        }
        if !(self.sampling_fraction > 0.0 && self.sampling_fraction <= 1.0) {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "sampling fraction must be in (0, 1], got {}",
                self.sampling_fraction
            )));
        }
        if self.learning_rate <= 0.0 {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.max_iterations == 0 {
            return Err(RegistrationError::InvalidConfiguration(
                "iteration cap must be at least 1".to_string(),
            ));
        }
        if self.convergence_window < 2 {
            return Err(RegistrationError::InvalidConfiguration(format!(
                "convergence window must be at least 2, got {}",
                self.convergence_window
            )));
        }
        if self.pyramid.is_empty() {
            return Err(RegistrationError::InvalidConfiguration(
                "pyramid schedule must have at least one level".to_string(),
            ));
        }
        for level in &self.pyramid {
            if level.shrink == 0 {
                return Err(RegistrationError::InvalidConfiguration(
                    "shrink factors must be at least 1".to_string(),
                ));
            }
            if level.sigma < 0.0 {
                return Err(RegistrationError::InvalidConfiguration(format!(
                    "smoothing sigma must be non-negative, got {}",
                    level.sigma
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_standard_protocol() {
        let config = RegistrationConfig::default();
        assert_eq!(config.histogram_bins, 50);
        assert_eq!(config.sampling_fraction, 0.01);
        assert_eq!(config.learning_rate, 1.0);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.convergence_value, 1e-6);
        assert_eq!(config.convergence_window, 10);
        let shrinks: Vec<usize> = config.pyramid.iter().map(|l| l.shrink).collect();
        let sigmas: Vec<f64> = config.pyramid.iter().map(|l| l.sigma).collect();
        assert_eq!(shrinks, vec![4, 2, 1]);
        assert_eq!(sigmas, vec![2.0, 1.0, 0.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = RegistrationConfig::default();
        config.sampling_fraction = 0.0;
        assert!(config.validate().is_err());

        let mut config = RegistrationConfig::default();
        config.histogram_bins = 1;
        assert!(config.validate().is_err());

        let mut config = RegistrationConfig::default();
        config.pyramid.clear();
        assert!(config.validate().is_err());

        let mut config = RegistrationConfig::default();
        config.convergence_window = 1;
        assert!(config.validate().is_err());
    }
}
