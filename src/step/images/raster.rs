//! PNG and JPEG re-encoding.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};

use crate::step::AssetError;

/// Lossless PNG re-encode at `level` (0-7).
pub fn optimize_png(path: &Path, data: &[u8], level: u8) -> Result<Vec<u8>, AssetError> {
    let img = decode(path, data, ImageFormat::Png)?;

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, compression_for(level), FilterType::Adaptive);
    img.write_with_encoder(encoder).map_err(|e| AssetError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(out)
}

/// Lossy JPEG re-encode at `quality` (1-100).
pub fn optimize_jpeg(path: &Path, data: &[u8], quality: u8) -> Result<Vec<u8>, AssetError> {
    let img = decode(path, data, ImageFormat::Jpeg)?;
    // The JPEG encoder takes no alpha channel and no 16-bit samples.
    let img = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.write_with_encoder(encoder).map_err(|e| AssetError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(out)
}

fn decode(path: &Path, data: &[u8], format: ImageFormat) -> Result<DynamicImage, AssetError> {
    image::ImageReader::with_format(Cursor::new(data), format)
        .decode()
        .map_err(|e| AssetError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Map the 0-7 level onto the encoder presets.
fn compression_for(level: u8) -> CompressionType {
    match level {
        0..=1 => CompressionType::Fast,
        2..=4 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}
