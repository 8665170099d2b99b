//! Gradient descent with line search over rigid parameters.

use std::collections::VecDeque;

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;
use petra_core::image::Image;
use petra_core::spatial::Point3;
use petra_core::transform::RigidTransform;

/// Per-parameter preconditioning derived from physical displacement.
///
/// A unit change of a rotation angle displaces points near the image corner
/// by roughly the center-to-corner radius, while a unit translation moves
/// every point by one millimeter. Dividing rotation gradients by the squared
/// radius equalizes the physical step size of the two parameter groups.
#[derive(Debug, Clone, Copy)]
pub struct ParameterScales {
    pub translation: f64,
    pub rotation: f64,
}

impl ParameterScales {
    pub fn from_physical_shift<B: AutodiffBackend>(
        fixed: &Image<B, 3>,
        center: &Point3,
    ) -> Self {
        let radius = fixed.max_radius(center).max(1.0);
        Self {
            translation: 1.0,
            rotation: radius * radius,
        }
    }
}

/// One optimization step: steepest descent with backtracking line search.
///
/// The candidate step is evaluated with the caller-provided loss closure and
/// halved until it improves on the current loss. The input transform is
/// never modified; accepted candidates are fresh copies.
pub struct GradientDescentLineSearch {
    learning_rate: f64,
    max_halvings: usize,
    scales: ParameterScales,
}

impl GradientDescentLineSearch {
    pub fn new(learning_rate: f64, scales: ParameterScales) -> Self {
        Self {
            learning_rate,
            max_halvings: 8,
            scales,
        }
    }

    /// Attempt a descent step. Returns the improved transform and its loss,
    /// or `None` when no step length along the gradient improves the loss.
    pub fn step<B, F>(
        &self,
        transform: &RigidTransform<B>,
        current_loss: f64,
        grads: &B::Gradients,
        eval: F,
    ) -> Option<(RigidTransform<B>, f64)>
    where
        B: AutodiffBackend,
        F: Fn(&RigidTransform<B>) -> f64,
    {
        let grad_translation = gradient3(transform.translation(), grads)?;
        let grad_rotation = gradient3(transform.rotation(), grads)?;

        let norm = grad_translation
            .iter()
            .chain(grad_rotation.iter())
            .map(|g| g * g)
            .sum::<f64>()
            .sqrt();
        if norm < f64::EPSILON {
            return None;
        }

        let (translation, rotation, _) = transform.params();
        let mut step = self.learning_rate;
        for _ in 0..=self.max_halvings {
            let mut candidate_translation = [0.0; 3];
            let mut candidate_rotation = [0.0; 3];
            for i in 0..3 {
                candidate_translation[i] =
                    translation[i] - step * grad_translation[i] / self.scales.translation;
                candidate_rotation[i] =
                    rotation[i] - step * grad_rotation[i] / self.scales.rotation;
            }

            let candidate = transform.with_params(candidate_translation, candidate_rotation);
            let loss = eval(&candidate);
            if loss.is_finite() && loss < current_loss {
                return Some((candidate, loss));
            }
            step *= 0.5;
        }
        None
    }
}

/// Gradient of a `[3]` parameter tensor, if it participated in the loss.
fn gradient3<B: AutodiffBackend>(param: Tensor<B, 1>, grads: &B::Gradients) -> Option<[f64; 3]> {
    let grad = param.grad(grads)?;
    let data = grad.into_data();
    let slice = data.as_slice::<f32>().ok()?;
    Some([slice[0] as f64, slice[1] as f64, slice[2] as f64])
}

/// Sliding window over recent metric values.
///
/// Reports convergence when the window is full and the mean absolute change
/// between consecutive values falls below the threshold.
pub struct ConvergenceWindow {
    capacity: usize,
    threshold: f64,
    values: VecDeque<f64>,
}

impl ConvergenceWindow {
    pub fn new(capacity: usize, threshold: f64) -> Self {
        Self {
            capacity,
            threshold,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a metric value; true when the window signals convergence.
    pub fn push(&mut self, value: f64) -> bool {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);

        if self.values.len() < self.capacity {
            return false;
        }
        let mut change = 0.0;
        for pair in self.values.iter().zip(self.values.iter().skip(1)) {
            change += (pair.1 - pair.0).abs();
        }
        change / (self.capacity - 1) as f64 <= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_needs_to_fill_before_converging() {
        let mut window = ConvergenceWindow::new(3, 1e-6);
        assert!(!window.push(1.0));
        assert!(!window.push(1.0));
        assert!(window.push(1.0));
    }

    #[test]
    fn test_window_rejects_changing_values() {
        let mut window = ConvergenceWindow::new(3, 1e-6);
        assert!(!window.push(1.0));
        assert!(!window.push(0.5));
        assert!(!window.push(0.25));
        // Once the values settle, the oldest moving entries age out.
        assert!(!window.push(0.25));
        assert!(window.push(0.25));
    }
}
