//! Plain-text calibration files.
//!
//! A light matrix is three lines, one light per line, each holding three
//! whitespace-separated numbers `x y z`. Blank lines and lines starting with
//! `#` are ignored. A sphere file holds `row col radius` on one line.

use std::fmt::Write as _;
use std::path::Path;

use crate::photometric::common::error::{PhotometricError, Result};
use crate::photometric::solver::{CalibrationMatrix, LightMatrix};
use crate::photometric::sphere::SphereCentroid;

fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn parse_numbers<T: std::str::FromStr>(line: &str, expected: usize) -> Result<Vec<T>> {
    let values = line
        .split_whitespace()
        .map(|token| {
            token
                .parse::<T>()
                .map_err(|_| PhotometricError::InvalidCalibration(format!("not a number: {token:?}")))
        })
        .collect::<Result<Vec<T>>>()?;
    if values.len() != expected {
        return Err(PhotometricError::InvalidCalibration(format!(
            "expected {expected} values, found {} in {line:?}",
            values.len()
        )));
    }
    Ok(values)
}

fn parse_rows<T: std::str::FromStr + Copy + Default>(text: &str) -> Result<[[T; 3]; 3]> {
    let lines: Vec<&str> = content_lines(text).collect();
    if lines.len() != 3 {
        return Err(PhotometricError::InvalidCalibration(format!(
            "expected 3 lights, found {}",
            lines.len()
        )));
    }
    let mut rows = [[T::default(); 3]; 3];
    for (row, line) in rows.iter_mut().zip(lines) {
        let values = parse_numbers::<T>(line, 3)?;
        row.copy_from_slice(&values);
    }
    Ok(rows)
}

pub fn parse_light_matrix(text: &str) -> Result<LightMatrix> {
    let rows = parse_rows::<f64>(text)?;
    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(PhotometricError::InvalidCalibration("non-finite light component".to_string()));
    }
    Ok(LightMatrix::new(rows))
}

/// Integer-only variant; cells must also lie in the calibration range.
pub fn parse_calibration_matrix(text: &str) -> Result<CalibrationMatrix> {
    CalibrationMatrix::new(parse_rows::<i32>(text)?)
}

pub fn format_light_matrix(lights: &LightMatrix) -> String {
    let mut out = String::new();
    for row in lights.rows() {
        let _ = writeln!(out, "{} {} {}", row[0], row[1], row[2]);
    }
    out
}

pub fn format_centroid(centroid: &SphereCentroid) -> String {
    format!("{} {} {}\n", centroid.row, centroid.col, centroid.radius)
}

/// Starting matrix for a search. Integer files inside the calibration range
/// are taken as-is; anything else is read as a light matrix and rounded onto
/// the integer grid.
pub fn parse_search_seed(text: &str) -> Result<CalibrationMatrix> {
    match parse_calibration_matrix(text) {
        Ok(matrix) => Ok(matrix),
        Err(_) => Ok(CalibrationMatrix::from_light_matrix(&parse_light_matrix(text)?)),
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PhotometricError::LoadError(format!("{}: {}", path.display(), e)))
}

fn write_text(path: &Path, text: String) -> Result<()> {
    std::fs::write(path, text).map_err(|e| PhotometricError::OutputWriteError(format!("{}: {}", path.display(), e)))
}

pub fn read_light_matrix(path: &Path) -> Result<LightMatrix> {
    parse_light_matrix(&read_text(path)?)
}

pub fn read_search_seed(path: &Path) -> Result<CalibrationMatrix> {
    parse_search_seed(&read_text(path)?)
}

pub fn write_light_matrix(path: &Path, lights: &LightMatrix) -> Result<()> {
    write_text(path, format_light_matrix(lights))
}

pub fn write_centroid(path: &Path, centroid: &SphereCentroid) -> Result<()> {
    write_text(path, format_centroid(centroid))
}
