//! JPEG encoding.
//!
//! Uses the `image` crate's baseline JPEG encoder. JPEG has no alpha
//! channel, so the alpha of the decoded buffer is discarded.

use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::{ExtendedColorType, ImageEncoder as _};

use super::types::{normalize_quality, validate_image};
use super::{EncodeError, ImageEncoder};
use crate::decode::DecodedImage;
use crate::format::OutputFormat;

/// Lossy JPEG encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpg
    }

    fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        validate_image(image)?;

        let rgb = image.to_rgb_pixels();
        let mut buffer = Vec::new();

        ImageJpegEncoder::new_with_quality(&mut buffer, normalize_quality(quality))
            .write_image(&rgb, image.width, image.height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::failed(OutputFormat::Jpg, e.to_string()))?;

        Ok(buffer)
    }
}
