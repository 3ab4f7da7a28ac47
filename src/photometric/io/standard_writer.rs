use std::io::{Cursor, Write};

use image::{ExtendedColorType, ImageFormat};
use tiff::encoder::colortype::{Gray8, RGB8};
use tracing::debug;

use crate::photometric::common::error::{PhotometricError, Result};
use crate::photometric::field::{IntensityField, NormalMap};
use crate::photometric::io::types::{NormalMapFormat, TiffCompression, WriteOptions};
use crate::photometric::io::writer::NormalMapWriter;

/// Writes TIFF through the `tiff` encoder and PNG/JPEG through `image`.
pub struct StandardNormalMapWriter;

impl StandardNormalMapWriter {
    fn encode_tiff(
        width: usize,
        height: usize,
        samples: &[u8],
        rgb: bool,
        options: &WriteOptions,
    ) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();

        let compression = match options.compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Balanced),
            TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Best),
        };

        let mut encoder = tiff::encoder::TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| PhotometricError::EncodeError(e.to_string()))?
            .with_compression(compression);

        if options.predictor {
            encoder = encoder.with_predictor(tiff::tags::Predictor::Horizontal);
        }

        let written = if rgb {
            encoder.write_image::<RGB8>(width as u32, height as u32, samples)
        } else {
            encoder.write_image::<Gray8>(width as u32, height as u32, samples)
        };
        written.map_err(|e| PhotometricError::EncodeError(e.to_string()))?;

        Ok(buffer)
    }

    fn encode_with_image(
        width: usize,
        height: usize,
        samples: &[u8],
        color: ExtendedColorType,
        format: ImageFormat,
    ) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image::write_buffer_with_format(&mut buffer, samples, width as u32, height as u32, color, format)
            .map_err(|e| PhotometricError::EncodeError(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    fn encode(
        width: usize,
        height: usize,
        samples: &[u8],
        rgb: bool,
        options: &WriteOptions,
    ) -> Result<Vec<u8>> {
        let color = if rgb { ExtendedColorType::Rgb8 } else { ExtendedColorType::L8 };
        match options.format {
            NormalMapFormat::Tiff => Self::encode_tiff(width, height, samples, rgb, options),
            NormalMapFormat::Png => Self::encode_with_image(width, height, samples, color, ImageFormat::Png),
            NormalMapFormat::Jpeg => Self::encode_with_image(width, height, samples, color, ImageFormat::Jpeg),
        }
    }
}

impl NormalMapWriter for StandardNormalMapWriter {
    fn write_normal_map(&self, map: &NormalMap, output: &mut dyn Write, options: &WriteOptions) -> Result<()> {
        debug!("Encoding normal map {}x{} as {:?}", map.width(), map.height(), options.format);

        let buffer = Self::encode(map.width(), map.height(), &map.to_rgb_bytes(), true, options)?;
        output.write_all(&buffer)?;

        debug!("Normal map encoding complete, {} bytes", buffer.len());
        Ok(())
    }

    fn write_field(&self, field: &IntensityField, output: &mut dyn Write, options: &WriteOptions) -> Result<()> {
        debug!("Encoding field {}x{} as {:?}", field.width(), field.height(), options.format);

        let gray: Vec<u8> = if field.channels() == 1 {
            field.as_raw().to_vec()
        } else {
            (0..field.height())
                .flat_map(|row| (0..field.width()).map(move |col| (row, col)))
                .map(|(row, col)| field.get(row, col))
                .collect()
        };
        let buffer = Self::encode(field.width(), field.height(), &gray, false, options)?;
        output.write_all(&buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometric::reconstruct::SENTINEL_COLOR;

    fn sample_map() -> NormalMap {
        let pixels = vec![SENTINEL_COLOR, [201, 201, 201], [0, 127, 255], [10, 20, 30]];
        NormalMap::from_pixels(2, 2, pixels, 3).unwrap()
    }

    #[test]
    fn test_png_preserves_rgb_order() {
        let options = WriteOptions { format: NormalMapFormat::Png, ..WriteOptions::default() };
        let mut output = Vec::new();
        StandardNormalMapWriter.write_normal_map(&sample_map(), &mut output, &options).unwrap();

        let decoded = image::load_from_memory(&output).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0).0, SENTINEL_COLOR);
        assert_eq!(decoded.get_pixel(0, 1).0, [0, 127, 255]);
    }

    #[test]
    fn test_tiff_output_has_tiff_magic() {
        for compression in [TiffCompression::None, TiffCompression::Lzw, TiffCompression::DeflateBalanced] {
            let options = WriteOptions {
                format: NormalMapFormat::Tiff,
                compression,
                predictor: false,
            };
            let mut output = Vec::new();
            StandardNormalMapWriter.write_normal_map(&sample_map(), &mut output, &options).unwrap();
            assert!(output.starts_with(b"II*\0") || output.starts_with(b"MM\0*"));
        }
    }

    #[test]
    fn test_jpeg_output_is_decodable() {
        let mut output = Vec::new();
        StandardNormalMapWriter
            .write_normal_map(&sample_map(), &mut output, &WriteOptions::default())
            .unwrap();
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[test]
    fn test_gray_field_png() {
        let field = IntensityField::from_gray(2, 1, vec![0, 255]).unwrap();
        let options = WriteOptions { format: NormalMapFormat::Png, ..WriteOptions::default() };
        let mut output = Vec::new();
        StandardNormalMapWriter.write_field(&field, &mut output, &options).unwrap();

        let decoded = image::load_from_memory(&output).unwrap().to_luma8();
        assert_eq!(decoded.into_raw(), vec![0, 255]);
    }
}
