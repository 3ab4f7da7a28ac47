//! Normal-map quality cost used as the calibration search objective.

use crate::photometric::field::NormalMap;

/// Neutral value of the two lateral channels.
const NEUTRAL: i32 = 125;

/// Sums `(255 - R) + |125 - G| + |125 - B|` over every pixel. Lower is better:
/// the cost is smallest when normals face the camera (R saturated) and do
/// not tilt sideways (G and B at the midpoint).
///
/// Sentinel pixels are scored like any other. Whether a pixel is shadowed
/// depends only on the inputs and the threshold, never on the light matrix,
/// so their share of the cost is the same for every candidate.
pub fn score(map: &NormalMap) -> u64 {
    map.pixels()
        .iter()
        .map(|&[r, g, b]| {
            let forward = 255 - r as i32;
            let lateral = (NEUTRAL - g as i32).abs() + (NEUTRAL - b as i32).abs();
            (forward + lateral) as u64
        })
        .sum()
}
