use std::path::Path;

use crate::photometric::common::error::{PhotometricError, Result};
use crate::photometric::field::IntensityField;

pub trait IntensityReader {
    /// Decodes an encoded image into a single-channel field.
    fn read_gray(&self, data: &[u8]) -> Result<IntensityField>;

    fn read_gray_file(&self, path: &Path) -> Result<IntensityField> {
        let data = std::fs::read(path)
            .map_err(|e| PhotometricError::LoadError(format!("{}: {}", path.display(), e)))?;
        self.read_gray(&data)
            .map_err(|e| PhotometricError::LoadError(format!("{}: {}", path.display(), e)))
    }
}
