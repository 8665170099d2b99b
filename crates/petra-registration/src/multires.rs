//! Coarse-to-fine registration across an image pyramid.

use burn::tensor::backend::AutodiffBackend;
use petra_core::filter::ImagePyramid;
use petra_core::image::Image;
use petra_core::spatial::Point3;
use petra_core::transform::RigidTransform;

use crate::config::RegistrationConfig;
use crate::error::Result;
use crate::initializer::moments_initializer;
use crate::metric::MattesMutualInformation;
use crate::optimizer::ParameterScales;
use crate::registration::Registration;
use crate::report::{LevelReport, RegistrationReport};

/// Register `moving` to `fixed` with a rigid transform.
///
/// When no initial transform is supplied, the images' centers of mass are
/// aligned first. A supplied initial transform is copied before any
/// optimization, so the caller's instance is never mutated and can be
/// reused across repeated calls.
///
/// Optimization runs coarse to fine over the configured pyramid, carrying
/// the transform from each level into the next. The returned report holds
/// the per-level stop conditions, the final metric value, and the final
/// parameters; a registration that hits its iteration cap still returns its
/// best-effort transform.
pub fn register<B: AutodiffBackend>(
    fixed: &Image<B, 3>,
    moving: &Image<B, 3>,
    config: &RegistrationConfig,
    initial: Option<&RigidTransform<B>>,
) -> Result<(RigidTransform<B>, RegistrationReport)> {
    config.validate()?;

    let mut transform = match initial {
        Some(supplied) => {
            let (translation, rotation, center) = supplied.params();
            RigidTransform::from_params(translation, rotation, center, &fixed.data().device())
        }
        None => moments_initializer(fixed, moving),
    };

    let metric = MattesMutualInformation::new(
        config.histogram_bins,
        config.sampling_fraction,
        config.sampling_seed,
    );

    let fixed_pyramid = ImagePyramid::new(fixed, &config.pyramid);
    let moving_pyramid = ImagePyramid::new(moving, &config.pyramid);

    let (_, _, center) = transform.params();
    let center = Point3::new(center);

    let registration = Registration::new(config);
    let mut levels = Vec::with_capacity(config.pyramid.len());

    for (index, schedule) in config.pyramid.iter().enumerate() {
        let fixed_level = fixed_pyramid.level(index);
        let moving_level = moving_pyramid.level(index);

        tracing::info!(
            level = index + 1,
            total = config.pyramid.len(),
            shrink = schedule.shrink,
            sigma = schedule.sigma,
            fixed_shape = ?fixed_level.shape(),
            "registration level"
        );

        let scales = ParameterScales::from_physical_shift(fixed_level, &center);
        let (next, outcome) =
            registration.run_level(fixed_level, moving_level, transform, &metric, scales);
        transform = next;

        levels.push(LevelReport {
            shrink: schedule.shrink,
            sigma: schedule.sigma,
            iterations: outcome.iterations,
            final_metric: outcome.final_metric,
            stop: outcome.stop,
        });
    }

    let final_metric = levels.last().map(|level| level.final_metric).unwrap_or(0.0);
    let (translation, rotation, center) = transform.params();
    let report = RegistrationReport {
        levels,
        final_metric,
        translation,
        rotation,
        center,
    };

    tracing::info!(
        final_metric,
        translation = ?report.translation,
        rotation = ?report.rotation,
        "registration finished"
    );

    Ok((transform, report))
}
