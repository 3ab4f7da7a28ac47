//! Intensity reader backed by the `image` crate.
//!
//! Any format the enabled `image` decoders understand (JPEG, PNG) is
//! accepted. Colour inputs are reduced to luma, so the three photographs
//! and the calibration mask always reach the core as one-channel fields.

use tracing::debug;

use crate::photometric::common::error::{PhotometricError, Result};
use crate::photometric::field::IntensityField;
use crate::photometric::io::reader::IntensityReader;

pub struct ImageFileReader;

impl IntensityReader for ImageFileReader {
    fn read_gray(&self, data: &[u8]) -> Result<IntensityField> {
        debug!("Decoding image, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| PhotometricError::LoadError(e.to_string()))?;
        let gray = decoded.to_luma8();
        let (width, height) = gray.dimensions();

        debug!("Decoded image: {}x{}", width, height);

        IntensityField::from_gray(width as usize, height as usize, gray.into_raw())
    }
}
