//! Single-level registration loop.

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use petra_core::image::Image;
use petra_core::transform::RigidTransform;

use crate::config::RegistrationConfig;
use crate::metric::Metric;
use crate::optimizer::{ConvergenceWindow, GradientDescentLineSearch, ParameterScales};
use crate::report::StopCondition;

/// Result of optimizing one resolution level.
pub(crate) struct LevelOutcome {
    pub iterations: usize,
    pub final_metric: f64,
    pub stop: StopCondition,
}

/// Drives the optimizer against a metric at a single resolution.
pub(crate) struct Registration<'a> {
    config: &'a RegistrationConfig,
}

impl<'a> Registration<'a> {
    pub fn new(config: &'a RegistrationConfig) -> Self {
        Self { config }
    }

    /// Minimize the metric starting from `transform`.
    ///
    /// The loop stops on the convergence window, the iteration cap, or a
    /// stalled line search, and always returns the best transform reached;
    /// the stop condition is reported rather than raised.
    pub fn run_level<B, M>(
        &self,
        fixed: &Image<B, 3>,
        moving: &Image<B, 3>,
        transform: RigidTransform<B>,
        metric: &M,
        scales: ParameterScales,
    ) -> (RigidTransform<B>, LevelOutcome)
    where
        B: AutodiffBackend,
        M: Metric<B>,
    {
        let optimizer = GradientDescentLineSearch::new(self.config.learning_rate, scales);
        let mut window =
            ConvergenceWindow::new(self.config.convergence_window, self.config.convergence_value);
        let eval = |candidate: &RigidTransform<B>| -> f64 {
            metric
                .loss(fixed, moving, candidate)
                .into_scalar()
                .elem::<f64>()
        };

        let mut current = transform;
        let mut current_loss = f64::INFINITY;
        let mut stop = StopCondition::IterationLimit;
        let mut iterations = 0;

        for iteration in 0..self.config.max_iterations {
            iterations = iteration + 1;

            let loss = metric.loss(fixed, moving, &current);
            current_loss = loss.clone().into_scalar().elem::<f64>();
            if iteration % 20 == 0 {
                tracing::debug!(iteration, metric = current_loss, "registration step");
            }

            if window.push(current_loss) {
                stop = StopCondition::Converged { iteration };
                break;
            }

            let grads = loss.backward();
            match optimizer.step(&current, current_loss, &grads, eval) {
                Some((next, next_loss)) => {
                    current = next;
                    current_loss = next_loss;
                }
                None => {
                    stop = StopCondition::Stalled { iteration };
                    break;
                }
            }
        }

        (
            current,
            LevelOutcome {
                iterations,
                final_metric: current_loss,
                stop,
            },
        )
    }
}
