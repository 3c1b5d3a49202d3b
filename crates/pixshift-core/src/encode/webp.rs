//! Lossy WebP encoding through libwebp.

use super::types::{normalize_quality, validate_image};
use super::{EncodeError, ImageEncoder};
use crate::decode::DecodedImage;
use crate::format::OutputFormat;

/// Lossy WebP encoder. Alpha is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        validate_image(image)?;

        let quality = normalize_quality(quality) as f32;
        let memory = ::webp::Encoder::from_rgba(&image.pixels, image.width, image.height)
            .encode_simple(false, quality)
            .map_err(|e| EncodeError::failed(OutputFormat::WebP, format!("{:?}", e)))?;

        Ok(memory.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_bytes;

    fn gradient(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_webp_riff_header() {
        let bytes = WebPEncoder.encode(&gradient(32, 32), 80).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_webp_decodes_back() {
        let bytes = WebPEncoder.encode(&gradient(40, 24), 60).unwrap();
        let decoded = decode_bytes(&bytes).unwrap();

        assert_eq!((decoded.width, decoded.height), (40, 24));
    }

    #[test]
    fn test_webp_lower_quality_is_smaller() {
        let img = gradient(64, 64);
        let low = WebPEncoder.encode(&img, 10).unwrap();
        let high = WebPEncoder.encode(&img, 100).unwrap();

        assert!(low.len() < high.len());
    }
}
