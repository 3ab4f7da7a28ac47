//! File-level orchestration
//!
//! Loads photographs through an [`IntensityReader`](crate::photometric::io::IntensityReader),
//! runs the calibration search and reconstruction, and hands the result to a
//! [`NormalMapWriter`](crate::photometric::io::NormalMapWriter).

mod normal_map;
mod calibration;
pub mod types;

#[cfg(test)]
mod tests;

pub use normal_map::{NormalMapPipeline, INPUT_NAMES};
pub use calibration::calibrate_files;
pub use types::{NormalMapReport, PipelineConfig, PipelineConfigBuilder};
