//! Output encoding options

use crate::photometric::common::error::{PhotometricError, Result};

/// Container format of written images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalMapFormat {
    Tiff,
    Png,
    Jpeg,
}

impl NormalMapFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            NormalMapFormat::Tiff => "tiff",
            NormalMapFormat::Png => "png",
            NormalMapFormat::Jpeg => "jpg",
        }
    }

    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "tif" | "tiff" => Ok(NormalMapFormat::Tiff),
            "png" => Ok(NormalMapFormat::Png),
            "jpg" | "jpeg" => Ok(NormalMapFormat::Jpeg),
            other => Err(PhotometricError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub format: NormalMapFormat,
    /// Only used for [`NormalMapFormat::Tiff`]
    pub compression: TiffCompression,
    /// Horizontal differencing predictor for compressed TIFF
    pub predictor: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            format: NormalMapFormat::Jpeg,
            compression: TiffCompression::None,
            predictor: false,
        }
    }
}
