//! Percentile-based intensity normalization.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// The `q`-th percentile (0..=100) of the volume's intensities.
///
/// Linear interpolation between the two nearest order statistics, matching
/// the conventional definition. Used as a per-modality normalization
/// divisor before prediction.
pub fn percentile<B: Backend>(volume: &Tensor<B, 3>, q: f64) -> f32 {
    let data = volume.clone().into_data();
    let mut values = data
        .as_slice::<f32>()
        .expect("volume data is f32")
        .to_vec();
    assert!(!values.is_empty(), "cannot take a percentile of an empty volume");
    let q = q.clamp(0.0, 100.0);

    values.sort_unstable_by(f32::total_cmp);

    let rank = q / 100.0 * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return values[lower];
    }
    let weight = (rank - lower as f64) as f32;
    values[lower] * (1.0 - weight) + values[upper] * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type B = NdArray<f32>;

    fn ramp() -> Tensor<B, 3> {
        let device = Default::default();
        let values: Vec<f32> = (0..1000).map(|v| v as f32).collect();
        Tensor::from_data(TensorData::new(values, [10, 10, 10]), &device)
    }

    #[test]
    fn test_extremes() {
        let volume = ramp();
        assert_eq!(percentile(&volume, 0.0), 0.0);
        assert_eq!(percentile(&volume, 100.0), 999.0);
    }

    #[test]
    fn test_median_of_ramp() {
        let volume = ramp();
        let median = percentile(&volume, 50.0);
        assert!((median - 499.5).abs() < 1e-3);
    }

    #[test]
    fn test_high_percentile_ignores_outlier_tail() {
        let device = Default::default();
        let mut values = vec![1.0f32; 999];
        values.push(1000.0);
        let volume = Tensor::<B, 3>::from_data(TensorData::new(values, [10, 10, 10]), &device);

        let p999 = percentile(&volume, 99.9);
        assert!(p999 < 1000.0);
        assert!(p999 >= 1.0);
    }
}
