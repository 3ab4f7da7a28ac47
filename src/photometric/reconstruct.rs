//! Per-pixel normal reconstruction from three aligned photographs.

use tracing::{debug, instrument};

use crate::photometric::common::error::Result;
use crate::photometric::field::{IntensityField, NormalMap, Vector3, unit_vector};
use crate::photometric::solver::{InverseLightMatrix, LightMatrix};

/// Written in place of a normal wherever a pixel is shadowed in at least one
/// photograph.
pub const SENTINEL_COLOR: [u8; 3] = [255, 125, 125];

/// Reconstructs a normal map from three photographs lit by the rows of
/// `lights`, in the same order.
///
/// A pixel is solved only when all three intensities exceed `threshold`;
/// otherwise it receives [`SENTINEL_COLOR`]. Solved normals are normalized,
/// remapped from `[-1, 1]` to `[0, 255]` and stored with component 2 in R,
/// component 1 in G and component 0 in B.
///
/// Fails before touching any pixel when the fields differ in size or the
/// light matrix is singular.
#[instrument(level = "trace", skip(a, b, c, lights))]
pub fn reconstruct(
    a: &IntensityField,
    b: &IntensityField,
    c: &IntensityField,
    threshold: u8,
    lights: &LightMatrix,
) -> Result<NormalMap> {
    a.ensure_same_dimensions(b)?;
    a.ensure_same_dimensions(c)?;
    let inverse = lights.invert()?;
    reconstruct_with_inverse(a, b, c, threshold, &inverse)
}

/// Same pass as [`reconstruct`] with an already inverted light matrix.
/// Field sizes must already be known to match.
pub(crate) fn reconstruct_with_inverse(
    a: &IntensityField,
    b: &IntensityField,
    c: &IntensityField,
    threshold: u8,
    inverse: &InverseLightMatrix,
) -> Result<NormalMap> {
    let (width, height) = a.dimensions();
    let mut pixels = Vec::with_capacity(width * height);
    let mut valid = 0;

    for row in 0..height {
        for col in 0..width {
            let intensities = [a.get(row, col), b.get(row, col), c.get(row, col)];
            let pixel = if intensities.iter().all(|&i| i > threshold) {
                solve_pixel(inverse, intensities)
            } else {
                None
            };
            match pixel {
                Some(rgb) => {
                    valid += 1;
                    pixels.push(rgb);
                }
                None => pixels.push(SENTINEL_COLOR),
            }
        }
    }

    debug!(width, height, valid, "Normal map reconstructed");
    NormalMap::from_pixels(width, height, pixels, valid)
}

#[inline]
fn solve_pixel(inverse: &InverseLightMatrix, intensities: [u8; 3]) -> Option<[u8; 3]> {
    let normal = unit_vector(&inverse.solve_normal(intensities.map(f64::from)))?;
    Some(encode_normal(&normal))
}

/// Maps a unit normal to the stored RGB triple.
#[inline]
pub fn encode_normal(normal: &Vector3) -> [u8; 3] {
    [to_byte(normal.z), to_byte(normal.y), to_byte(normal.x)]
}

#[inline]
fn to_byte(component: f64) -> u8 {
    ((component + 1.0) * 127.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometric::common::error::PhotometricError;
    use crate::photometric::solver::CalibrationMatrix;

    #[test]
    fn test_uniform_fields_with_identity_lights() {
        let field = IntensityField::filled(2, 2, 200);
        let lights = CalibrationMatrix::identity().to_light_matrix();

        let map = reconstruct(&field, &field, &field, 100, &lights).unwrap();

        // S⁻¹·(200, 200, 200) = (200, 200, 200) -> 1/√3 per component
        let expected = ((1.0 / 3f64.sqrt() + 1.0) * 127.5) as u8;
        assert_eq!(expected, 201);
        assert_eq!(map.valid_pixels(), 4);
        for &pixel in map.pixels() {
            assert_ne!(pixel, SENTINEL_COLOR);
            assert_eq!(pixel, [expected; 3]);
        }
    }

    #[test]
    fn test_channel_order_is_reversed_components() {
        // diag(1, 2, 4) with equal intensities -> N ∝ (1, 0.5, 0.25)
        let lights = LightMatrix::new([[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 4.0]]);
        let field = IntensityField::filled(1, 1, 100);

        let map = reconstruct(&field, &field, &field, 0, &lights).unwrap();

        let n = unit_vector(&Vector3::new(1.0, 0.5, 0.25)).unwrap();
        assert_eq!(map.pixel(0, 0), [to_byte(n.z), to_byte(n.y), to_byte(n.x)]);
        let [r, _, b] = map.pixel(0, 0);
        assert!(b > r);
    }

    #[test]
    fn test_shadowed_pixels_get_sentinel() {
        let lights = LightMatrix::new([[-20.0, 35.0, 180.0], [10.0, 150.0, 40.0], [-40.0, 12.0, 95.0]]);
        let a = IntensityField::from_gray(2, 2, vec![255, 50, 255, 51]).unwrap();
        let b = IntensityField::from_gray(2, 2, vec![255, 255, 50, 200]).unwrap();
        let c = IntensityField::from_gray(2, 2, vec![50, 255, 255, 200]).unwrap();

        let map = reconstruct(&a, &b, &c, 50, &lights).unwrap();

        assert_eq!(map.pixel(0, 0), SENTINEL_COLOR);
        assert_eq!(map.pixel(0, 1), SENTINEL_COLOR);
        assert_eq!(map.pixel(1, 0), SENTINEL_COLOR);
        assert_eq!(map.valid_pixels(), 1);
    }

    #[test]
    fn test_singular_lights_abort_reconstruction() {
        let field = IntensityField::filled(3, 3, 200);
        let lights = LightMatrix::new([[1.0, 1.0, 1.0], [2.0, 2.0, 2.0], [0.0, 1.0, 0.0]]);
        let result = reconstruct(&field, &field, &field, 10, &lights);
        assert!(matches!(result, Err(PhotometricError::SingularMatrix { .. })));
    }

    #[test]
    fn test_dimension_mismatch_is_checked_first() {
        let a = IntensityField::filled(3, 3, 200);
        let b = IntensityField::filled(3, 4, 200);
        let singular = LightMatrix::new([[0.0; 3]; 3]);
        let result = reconstruct(&a, &a, &b, 10, &singular);
        assert!(matches!(result, Err(PhotometricError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_encode_normal_extremes() {
        assert_eq!(encode_normal(&Vector3::new(-1.0, 0.0, 1.0)), [255, 127, 0]);
    }
}
