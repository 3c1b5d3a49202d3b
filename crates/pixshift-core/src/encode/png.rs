//! PNG encoding.
//!
//! PNG is lossless, so quality never changes the pixels. It only picks how
//! hard the deflate stage works:
//!
//! | quality  | compression |
//! |----------|-------------|
//! | > 80     | best        |
//! | < 20     | fast        |
//! | otherwise| default     |

use image::codecs::png::{CompressionType, FilterType, PngEncoder as ImagePngEncoder};
use image::{ExtendedColorType, ImageEncoder as _};

use super::types::validate_image;
use super::{EncodeError, ImageEncoder};
use crate::decode::DecodedImage;
use crate::format::OutputFormat;

/// Lossless PNG encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

/// Compression tier for a quality value.
pub fn compression_for_quality(quality: u8) -> CompressionType {
    if quality > 80 {
        CompressionType::Best
    } else if quality < 20 {
        CompressionType::Fast
    } else {
        CompressionType::Default
    }
}

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        validate_image(image)?;

        let mut buffer = Vec::new();
        ImagePngEncoder::new_with_quality(
            &mut buffer,
            compression_for_quality(quality),
            FilterType::Adaptive,
        )
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::failed(OutputFormat::Png, e.to_string()))?;

        Ok(buffer)
    }
}
