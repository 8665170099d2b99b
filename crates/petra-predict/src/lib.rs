pub mod crop;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pipeline;

pub use crop::{crop, crop_affine, foreground_box, CropBox};
pub use error::PredictError;
pub use model::PredictionModel;
pub use normalize::percentile;
pub use pipeline::{predict_volume, PredictConfig, Prediction, PredictionMeta};
