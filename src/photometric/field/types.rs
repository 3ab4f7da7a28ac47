//! Grid and vector types

use crate::photometric::common::error::{PhotometricError, Result};

/// Row-major grid of 8-bit samples with one or three interleaved channels.
///
/// Inputs are never mutated by the reconstruction stages; they only borrow
/// the field for the duration of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityField {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl IntensityField {
    /// Wraps an interleaved sample buffer. `channels` must be 1 or 3 and
    /// `data.len()` must equal `width * height * channels`.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        if channels != 1 && channels != 3 {
            return Err(PhotometricError::UnsupportedFormat(format!(
                "{channels} channels per pixel"
            )));
        }
        if width == 0 || height == 0 || data.len() != width * height * channels {
            return Err(PhotometricError::InvalidDimensions(width, height));
        }
        Ok(Self { width, height, channels, data })
    }

    pub fn from_gray(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, 1, data)
    }

    /// Single-channel field with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            channels: 1,
            data: vec![value; width * height],
        }
    }

    /// Single-channel field built from a `(row, col) -> sample` function.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self { width, height, channels: 1, data }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// First-channel sample at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.sample(row, col, 0)
    }

    #[inline]
    pub fn sample(&self, row: usize, col: usize, channel: usize) -> u8 {
        debug_assert!(row < self.height && col < self.width && channel < self.channels);
        self.data[(row * self.width + col) * self.channels + channel]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        debug_assert!(row < self.height && col < self.width);
        let base = (row * self.width + col) * self.channels;
        self.data[base..base + self.channels].fill(value);
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Fails with [`PhotometricError::DimensionMismatch`] unless `other` has
    /// the same width and height.
    pub fn ensure_same_dimensions(&self, other: &IntensityField) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(PhotometricError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: other.width,
                actual_height: other.height,
            });
        }
        Ok(())
    }
}

/// Light vectors, solved normals and intensity triples.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Unit vector in the direction of `v`, `None` for a zero or non-finite vector.
#[inline]
pub fn unit_vector(v: &Vector3) -> Option<Vector3> {
    v.try_normalize(0.0).filter(|unit| unit.iter().all(|c| c.is_finite()))
}

/// Row-major grid of RGB triples, one per reconstructed pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalMap {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
    valid_pixels: usize,
}

impl NormalMap {
    /// `valid_pixels` is the number of pixels holding a solved normal rather
    /// than the shadow sentinel.
    pub fn from_pixels(
        width: usize,
        height: usize,
        pixels: Vec<[u8; 3]>,
        valid_pixels: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 || pixels.len() != width * height || valid_pixels > pixels.len() {
            return Err(PhotometricError::InvalidDimensions(width, height));
        }
        Ok(Self { width, height, pixels, valid_pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        debug_assert!(row < self.height && col < self.width);
        self.pixels[row * self.width + col]
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    pub fn valid_pixels(&self) -> usize {
        self.valid_pixels
    }

    /// Interleaved `R, G, B, R, G, B, ...` bytes, ready for an encoder.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}
