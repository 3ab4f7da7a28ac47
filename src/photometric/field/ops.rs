use tracing::debug;

use crate::photometric::field::types::IntensityField;

/// 0/255 mask of the first channel: samples strictly above `cutoff` become 255.
pub fn binarize(field: &IntensityField, cutoff: u8) -> IntensityField {
    IntensityField::from_fn(field.width(), field.height(), |row, col| {
        if field.get(row, col) > cutoff { u8::MAX } else { 0 }
    })
}

/// Halves both dimensions with a 2x2 box filter over the first channel.
/// Fields narrower or shorter than 2 pixels are returned unchanged.
pub fn downsample_2x(field: &IntensityField) -> IntensityField {
    let (w, h) = field.dimensions();
    if w < 2 || h < 2 {
        return single_channel(field);
    }

    IntensityField::from_fn(w / 2, h / 2, |row, col| {
        let sr = row * 2;
        let sc = col * 2;
        let sum = field.get(sr, sc) as u16
            + field.get(sr, sc + 1) as u16
            + field.get(sr + 1, sc) as u16
            + field.get(sr + 1, sc + 1) as u16;
        (sum / 4) as u8
    })
}

/// Applies [`downsample_2x`] `levels` times, stopping early once a dimension
/// would drop below one pixel.
pub fn downsample(field: &IntensityField, levels: u32) -> IntensityField {
    let mut current = single_channel(field);
    for level in 0..levels {
        if current.width() < 2 || current.height() < 2 {
            debug!(level, "Field too small to downsample further");
            break;
        }
        current = downsample_2x(&current);
    }
    current
}

fn single_channel(field: &IntensityField) -> IntensityField {
    if field.channels() == 1 {
        return field.clone();
    }
    IntensityField::from_fn(field.width(), field.height(), |row, col| field.get(row, col))
}
