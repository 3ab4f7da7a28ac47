use std::path::Path;

use tracing::{info, instrument};

use crate::photometric::{
    common::error::Result,
    field::binarize,
    io::IntensityReader,
    sphere::{SphereCalibration, calibrate_lights},
};

/// Binarizes the sphere photograph at `mask_path` with `cutoff`, then
/// estimates one light vector from each of the three lit photographs.
#[instrument(skip(reader, mask_path, image_paths))]
pub fn calibrate_files<R: IntensityReader>(
    reader: &R,
    mask_path: &Path,
    image_paths: [&Path; 3],
    cutoff: u8,
) -> Result<SphereCalibration> {
    let sphere = reader.read_gray_file(mask_path)?;
    let mask = binarize(&sphere, cutoff);

    let [a, b, c] = image_paths.map(|path| reader.read_gray_file(path));
    let (a, b, c) = (a?, b?, c?);
    let calibration = calibrate_lights(&mask, [&a, &b, &c])?;

    info!(
        row = calibration.centroid.row,
        col = calibration.centroid.col,
        radius = calibration.centroid.radius,
        "Sphere calibrated"
    );
    Ok(calibration)
}
