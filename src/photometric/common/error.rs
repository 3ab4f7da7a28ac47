use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotometricError {
    #[error("Failed to load image: {0}")]
    LoadError(String),

    #[error("Calibration mask has no foreground pixel")]
    EmptyMask,

    #[error("Light matrix is singular (determinant {determinant})")]
    SingularMatrix { determinant: f64 },

    #[error("No invertible calibration found after {iterations} search iterations")]
    NoInvertibleCalibration { iterations: u64 },

    #[error(
        "Intensity fields differ in size: {expected_width}x{expected_height} vs {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to encode normal map: {0}")]
    EncodeError(String),

    #[error("Invalid calibration data: {0}")]
    InvalidCalibration(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PhotometricError>;
