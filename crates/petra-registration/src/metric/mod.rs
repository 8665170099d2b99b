//! Similarity metrics for registration.

pub mod mattes;
pub mod trait_;

pub use mattes::MattesMutualInformation;
pub use trait_::Metric;
