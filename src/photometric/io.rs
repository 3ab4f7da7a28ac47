//! Image and calibration I/O
//!
//! Decoding and encoding sit behind the [`IntensityReader`] and
//! [`NormalMapWriter`] traits so the pipeline can run against in-memory
//! mocks. Calibration matrices use a small plain-text format.

mod reader;
mod image_reader;
mod writer;
mod standard_writer;
pub mod types;
pub mod calibration_file;

pub use reader::IntensityReader;
pub use image_reader::ImageFileReader;
pub use writer::NormalMapWriter;
pub use standard_writer::StandardNormalMapWriter;
pub use types::{NormalMapFormat, TiffCompression, WriteOptions};
