//! 3×3 light matrices, their inversion, and the per-pixel normal solve.
//!
//! Rows of a light matrix are the three light vectors. Inversion uses the
//! cyclic cofactor expansion: every cofactor is built from the rows and
//! columns `(i + 1) % 3` and `(i + 2) % 3`, and the adjugate is divided by
//! the determinant. Near-zero determinants are rejected instead of divided by.

use std::fmt;
use std::ops::RangeInclusive;

use nalgebra::Matrix3;

use crate::photometric::common::error::{PhotometricError, Result};
use crate::photometric::field::Vector3;

/// Determinants with a smaller magnitude are treated as singular.
pub const DEFAULT_SINGULAR_TOLERANCE: f64 = 1e-9;

/// Three light vectors stacked as the rows of a 3×3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightMatrix {
    matrix: Matrix3<f64>,
}

impl LightMatrix {
    pub fn new(rows: [[f64; 3]; 3]) -> Self {
        let [r0, r1, r2] = rows;
        Self {
            matrix: Matrix3::new(
                r0[0], r0[1], r0[2],
                r1[0], r1[1], r1[2],
                r2[0], r2[1], r2[2],
            ),
        }
    }

    pub fn from_lights(lights: [Vector3; 3]) -> Self {
        let [a, b, c] = lights;
        Self { matrix: Matrix3::from_rows(&[a.transpose(), b.transpose(), c.transpose()]) }
    }

    pub fn identity() -> Self {
        Self { matrix: Matrix3::identity() }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn rows(&self) -> [[f64; 3]; 3] {
        let m = &self.matrix;
        [0usize, 1, 2].map(|r| [m[(r, 0)], m[(r, 1)], m[(r, 2)]])
    }

    pub fn light(&self, index: usize) -> Vector3 {
        self.matrix.row(index).transpose()
    }

    pub fn determinant(&self) -> f64 {
        let s = &self.matrix;
        (0..3)
            .map(|i| {
                s[(0, i)] * (s[(1, (i + 1) % 3)] * s[(2, (i + 2) % 3)] - s[(1, (i + 2) % 3)] * s[(2, (i + 1) % 3)])
            })
            .sum()
    }

    pub fn invert(&self) -> Result<InverseLightMatrix> {
        self.invert_with_tolerance(DEFAULT_SINGULAR_TOLERANCE)
    }

    /// Fails with [`PhotometricError::SingularMatrix`] when
    /// `|determinant| < tolerance`.
    pub fn invert_with_tolerance(&self, tolerance: f64) -> Result<InverseLightMatrix> {
        let determinant = self.determinant();
        if !determinant.is_finite() || determinant.abs() < tolerance {
            return Err(PhotometricError::SingularMatrix { determinant });
        }

        let s = &self.matrix;
        let inverse = Matrix3::from_fn(|i, j| {
            let cofactor = s[((j + 1) % 3, (i + 1) % 3)] * s[((j + 2) % 3, (i + 2) % 3)]
                - s[((j + 1) % 3, (i + 2) % 3)] * s[((j + 2) % 3, (i + 1) % 3)];
            cofactor / determinant
        });
        Ok(InverseLightMatrix { matrix: inverse })
    }

    /// `S · v`: the intensities a surface with normal `v` would reflect.
    pub fn apply(&self, v: &Vector3) -> Vector3 {
        self.matrix * v
    }
}

/// Inverse of a non-singular [`LightMatrix`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseLightMatrix {
    matrix: Matrix3<f64>,
}

impl InverseLightMatrix {
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// `N = S⁻¹ · I` for one pixel's three intensities. The result is not
    /// normalized; its length is the pixel's albedo-scaled response.
    #[inline]
    pub fn solve_normal(&self, intensities: [f64; 3]) -> Vector3 {
        self.matrix * Vector3::from(intensities)
    }
}

/// Integer light matrix explored by the calibration search.
///
/// Every cell lies in [`CalibrationMatrix::VALUE_RANGE`]. Random draws use
/// the narrower per-column ranges from [`CalibrationMatrix::column_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalibrationMatrix {
    cells: [[i32; 3]; 3],
}

impl CalibrationMatrix {
    pub const VALUE_RANGE: RangeInclusive<i32> = -50..=249;
    pub const FIRST_COLUMN_RANGE: RangeInclusive<i32> = -50..=24;
    pub const OTHER_COLUMN_RANGE: RangeInclusive<i32> = 0..=199;

    pub fn new(cells: [[i32; 3]; 3]) -> Result<Self> {
        for (r, row) in cells.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                if !Self::VALUE_RANGE.contains(&value) {
                    return Err(PhotometricError::InvalidCalibration(format!(
                        "cell ({r}, {c}) = {value} outside {:?}",
                        Self::VALUE_RANGE
                    )));
                }
            }
        }
        Ok(Self { cells })
    }

    pub fn identity() -> Self {
        Self { cells: [[1, 0, 0], [0, 1, 0], [0, 0, 1]] }
    }

    /// Range new random values for column `col` are drawn from: the first
    /// column admits a negative bearing, the other two do not.
    pub fn column_range(col: usize) -> RangeInclusive<i32> {
        if col == 0 {
            Self::FIRST_COLUMN_RANGE
        } else {
            Self::OTHER_COLUMN_RANGE
        }
    }

    pub fn cells(&self) -> &[[i32; 3]; 3] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.cells[row][col]
    }

    /// Copy with a single cell replaced, clamped into [`Self::VALUE_RANGE`].
    pub fn with_cell(&self, row: usize, col: usize, value: i32) -> Self {
        let mut cells = self.cells;
        cells[row][col] = value.clamp(*Self::VALUE_RANGE.start(), *Self::VALUE_RANGE.end());
        Self { cells }
    }

    /// Rounds a measured light matrix onto the integer grid, clamping each
    /// cell into [`Self::VALUE_RANGE`].
    pub fn from_light_matrix(lights: &LightMatrix) -> Self {
        let (lo, hi) = (*Self::VALUE_RANGE.start() as f64, *Self::VALUE_RANGE.end() as f64);
        let cells = lights.rows().map(|row| row.map(|v| v.round().clamp(lo, hi) as i32));
        Self { cells }
    }

    pub fn to_light_matrix(&self) -> LightMatrix {
        LightMatrix::new(self.cells.map(|row| row.map(f64::from)))
    }
}

impl fmt::Display for CalibrationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} {} {}", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}
