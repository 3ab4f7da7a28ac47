//! Needle maps: sparse normal glyphs drawn over a photograph.

use tracing::debug;

use crate::photometric::common::error::Result;
use crate::photometric::field::{IntensityField, Vector3, unit_vector};
use crate::photometric::solver::LightMatrix;

/// Length in pixels of a needle for a unit normal.
pub const NEEDLE_LENGTH: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Needle {
    pub row: usize,
    pub col: usize,
    /// Unit normal at the origin pixel
    pub normal: Vector3,
}

impl Needle {
    /// Tip of the needle: the normal's first two components, scaled by
    /// [`NEEDLE_LENGTH`], added to the origin's row and column.
    pub fn tip(&self) -> (f64, f64) {
        (
            self.row as f64 + self.normal.x * NEEDLE_LENGTH,
            self.col as f64 + self.normal.y * NEEDLE_LENGTH,
        )
    }
}

/// Solves normals on a `step`-spaced grid, keeping only pixels lit above
/// `threshold` in all three photographs.
pub fn compute_needles(
    a: &IntensityField,
    b: &IntensityField,
    c: &IntensityField,
    threshold: u8,
    lights: &LightMatrix,
    step: usize,
) -> Result<Vec<Needle>> {
    a.ensure_same_dimensions(b)?;
    a.ensure_same_dimensions(c)?;
    let inverse = lights.invert()?;
    let step = step.max(1);

    let mut needles = Vec::new();
    for row in (0..a.height()).step_by(step) {
        for col in (0..a.width()).step_by(step) {
            let intensities = [a.get(row, col), b.get(row, col), c.get(row, col)];
            if !intensities.iter().all(|&i| i > threshold) {
                continue;
            }
            if let Some(normal) = unit_vector(&inverse.solve_normal(intensities.map(f64::from))) {
                needles.push(Needle { row, col, normal });
            }
        }
    }

    debug!(count = needles.len(), step, "Needles computed");
    Ok(needles)
}

/// Copy of `base` with every needle drawn as a 255 line and a 0 dot at its
/// origin. Line pixels falling outside the image are dropped.
pub fn render_needles(base: &IntensityField, needles: &[Needle]) -> IntensityField {
    let mut canvas = IntensityField::from_fn(base.width(), base.height(), |r, c| base.get(r, c));
    for needle in needles {
        let (tip_row, tip_col) = needle.tip();
        draw_line(
            &mut canvas,
            (needle.row as i64, needle.col as i64),
            (tip_row.round() as i64, tip_col.round() as i64),
            u8::MAX,
        );
        canvas.set(needle.row, needle.col, 0);
    }
    canvas
}

/// Bresenham line between two `(row, col)` points, both ends included.
fn draw_line(canvas: &mut IntensityField, from: (i64, i64), to: (i64, i64), value: u8) {
    let (mut r, mut c) = from;
    let dr = (to.0 - from.0).abs();
    let dc = -(to.1 - from.1).abs();
    let step_r = if from.0 < to.0 { 1 } else { -1 };
    let step_c = if from.1 < to.1 { 1 } else { -1 };
    let mut err = dr + dc;

    loop {
        if r >= 0 && c >= 0 && (r as usize) < canvas.height() && (c as usize) < canvas.width() {
            canvas.set(r as usize, c as usize, value);
        }
        if r == to.0 && c == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dc {
            err += dc;
            r += step_r;
        }
        if e2 <= dr {
            err += dr;
            c += step_c;
        }
    }
}
