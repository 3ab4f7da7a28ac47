//! Light calibration from photographs of a uniformly reflective sphere.
//!
//! A binarized mask of the sphere gives its centre and an approximate
//! radius; the brightest pixel of each lit photograph is then lifted onto
//! the sphere surface to recover the light bearing, scaled by the peak
//! intensity.

use tracing::{debug, warn};

use crate::photometric::common::error::{PhotometricError, Result};
use crate::photometric::field::{IntensityField, Vector3, unit_vector};
use crate::photometric::solver::LightMatrix;

/// Sample value marking foreground in a calibration mask.
const FOREGROUND: u8 = u8::MAX;

/// Centre and approximate radius of the imaged calibration sphere.
///
/// `row` and `col` are the integer-truncated mean of the foreground
/// coordinates. `radius` is *not* `(max - min) / 2`: it is a quarter of the
/// averaged bounding-box extent, `((height + width) / 2) / 4` with integer
/// division, where height and width are `max - min` of the foreground rows
/// and columns. Light vectors only depend on its ratio to the highlight
/// offset, so treat it as an approximation, not a measured radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SphereCentroid {
    pub row: i64,
    pub col: i64,
    pub radius: i64,
}

/// Result of calibrating three lights against a reference sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCalibration {
    pub centroid: SphereCentroid,
    pub lights: LightMatrix,
}

/// Locates the sphere in a 0/255 mask.
///
/// Fails with [`PhotometricError::EmptyMask`] when no sample equals 255.
pub fn find_centroid(mask: &IntensityField) -> Result<SphereCentroid> {
    let mut area: u64 = 0;
    let mut row_sum: u64 = 0;
    let mut col_sum: u64 = 0;
    let mut top = usize::MAX;
    let mut bottom = 0;
    let mut left = usize::MAX;
    let mut right = 0;

    for row in 0..mask.height() {
        for col in 0..mask.width() {
            if mask.get(row, col) != FOREGROUND {
                continue;
            }
            top = top.min(row);
            bottom = bottom.max(row);
            left = left.min(col);
            right = right.max(col);
            area += 1;
            row_sum += row as u64;
            col_sum += col as u64;
        }
    }

    if area == 0 {
        return Err(PhotometricError::EmptyMask);
    }

    let box_height = (bottom - top) as i64;
    let box_width = (right - left) as i64;
    let radius = ((box_height + box_width) / 2) / 4;

    let centroid = SphereCentroid {
        row: (row_sum / area) as i64,
        col: (col_sum / area) as i64,
        radius,
    };
    debug!(
        area,
        row = centroid.row,
        col = centroid.col,
        radius = centroid.radius,
        "Sphere centroid located"
    );
    Ok(centroid)
}

/// Position and value of the brightest sample; the first one in row-major
/// order wins ties.
fn brightest_pixel(image: &IntensityField) -> (usize, usize, u8) {
    let mut best = (0, 0, 0u8);
    for row in 0..image.height() {
        for col in 0..image.width() {
            let value = image.get(row, col);
            if value > best.2 {
                best = (row, col, value);
            }
        }
    }
    best
}

/// Light vector for one photograph of the sphere.
///
/// The brightest pixel's offset from the centroid gives `dx` (rows) and `dy`
/// (columns); `dz` comes from `dz² = r² - dx² - dy²`, taking
/// `-sqrt(-value)` when the highlight falls outside the approximated radius.
/// The unit direction is scaled by the highlight's raw intensity, so the
/// magnitude encodes light strength. A highlight exactly at the centre of a
/// zero-radius sphere carries no bearing and yields the zero vector.
pub fn estimate_light_vector(image: &IntensityField, centroid: &SphereCentroid) -> Vector3 {
    let (row, col, peak) = brightest_pixel(image);

    let dx = row as i64 - centroid.row;
    let dy = col as i64 - centroid.col;
    let dz_squared = centroid.radius * centroid.radius - dx * dx - dy * dy;
    let dz = if dz_squared < 0 {
        -((-dz_squared) as f64).sqrt()
    } else {
        (dz_squared as f64).sqrt()
    };

    let direction = Vector3::new(dx as f64, dy as f64, dz);
    match unit_vector(&direction) {
        Some(unit) => {
            let light = unit * f64::from(peak);
            debug!(row, col, peak, x = light.x, y = light.y, z = light.z, "Light vector estimated");
            light
        }
        None => {
            warn!(row, col, "Highlight coincides with sphere centre; light has no bearing");
            Vector3::zeros()
        }
    }
}

/// Calibrates all three lights against one sphere mask. Each row of the
/// returned light matrix is the light vector of the matching photograph.
pub fn calibrate_lights(mask: &IntensityField, images: [&IntensityField; 3]) -> Result<SphereCalibration> {
    for image in images {
        mask.ensure_same_dimensions(image)?;
    }
    let centroid = find_centroid(mask)?;
    let lights = LightMatrix::from_lights(images.map(|image| estimate_light_vector(image, &centroid)));
    Ok(SphereCalibration { centroid, lights })
}
