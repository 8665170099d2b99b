pub mod nifti_io;

pub use nifti_io::{read_volume, write_volume};
