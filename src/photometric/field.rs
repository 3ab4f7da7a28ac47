//! Pixel containers shared by every stage: intensity grids in, normal maps out.

mod types;
mod ops;

pub use types::{IntensityField, NormalMap, Vector3, unit_vector};
pub use ops::{binarize, downsample, downsample_2x};
