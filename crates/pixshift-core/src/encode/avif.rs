//! AVIF encoding via the `image` crate's rav1e-backed encoder.

use image::codecs::avif::AvifEncoder as ImageAvifEncoder;
use image::{ExtendedColorType, ImageEncoder as _};

use super::types::{normalize_quality, validate_image};
use super::{EncodeError, ImageEncoder};
use crate::decode::DecodedImage;
use crate::format::OutputFormat;

/// Encoder speed (1 = slowest/best, 10 = fastest).
pub const AVIF_SPEED: u8 = 8;

/// Lossy AVIF encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvifEncoder;

impl ImageEncoder for AvifEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Avif
    }

    fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
        validate_image(image)?;

        let mut buffer = Vec::new();
        ImageAvifEncoder::new_with_speed_quality(&mut buffer, AVIF_SPEED, normalize_quality(quality))
            .write_image(
                &image.pixels,
                image.width,
                image.height,
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| EncodeError::failed(OutputFormat::Avif, e.to_string()))?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avif_ftyp_box() {
        let img = DecodedImage::new(16, 16, vec![90u8; 16 * 16 * 4]);
        let bytes = AvifEncoder.encode(&img, 70).unwrap();

        // ISO-BMFF: size(4) + "ftyp" + major brand "avif"
        assert_eq!(&bytes[4..8], b"ftyp");
        assert_eq!(&bytes[8..12], b"avif");
    }

    #[test]
    fn test_avif_rejects_empty_image() {
        let img = DecodedImage {
            width: 0,
            height: 0,
            pixels: vec![],
        };
        assert!(matches!(
            AvifEncoder.encode(&img, 70),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }
}
