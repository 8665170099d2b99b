//! Diagnostics returned alongside the final transform.

use serde::{Deserialize, Serialize};

/// Why a resolution level stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopCondition {
    /// The convergence window dropped below the configured threshold.
    Converged { iteration: usize },
    /// The iteration cap was reached without convergence.
    IterationLimit,
    /// The line search found no descent step.
    Stalled { iteration: usize },
}

/// Outcome of a single resolution level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelReport {
    pub shrink: usize,
    pub sigma: f64,
    pub iterations: usize,
    pub final_metric: f64,
    pub stop: StopCondition,
}

/// Outcome of a full multi-resolution registration.
///
/// Non-convergence shows up here, not as an error; callers that depend on
/// registration quality should inspect `final_metric` and the per-level
/// stop conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationReport {
    pub levels: Vec<LevelReport>,
    /// Metric value at the final accepted parameters (negated MI).
    pub final_metric: f64,
    /// Final translation parameters (mm).
    pub translation: [f64; 3],
    /// Final Euler angles (radians).
    pub rotation: [f64; 3],
    /// Fixed center of rotation (mm).
    pub center: [f64; 3],
}

impl RegistrationReport {
    /// True when every level ended in the converged state.
    pub fn fully_converged(&self) -> bool {
        self.levels
            .iter()
            .all(|level| matches!(level.stop, StopCondition::Converged { .. }))
    }
}
