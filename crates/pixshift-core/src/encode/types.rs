//! Encoder trait and shared encoding types.

use thiserror::Error;

use crate::decode::DecodedImage;
use crate::format::OutputFormat;

/// Quality used when a caller passes 0.
pub const DEFAULT_ENCODE_QUALITY: u8 = 75;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec rejected the image
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: OutputFormat,
        message: String,
    },
}

impl EncodeError {
    pub(crate) fn failed(format: OutputFormat, message: impl Into<String>) -> Self {
        EncodeError::EncodingFailed {
            format,
            message: message.into(),
        }
    }
}

/// Produces encoded bytes for one output format.
///
/// Implementations are stateless and shared across worker threads.
pub trait ImageEncoder: Send + Sync {
    /// The format this encoder writes.
    fn format(&self) -> OutputFormat;

    /// Encode an image at the given quality (0-100).
    ///
    /// Quality 0 selects [`DEFAULT_ENCODE_QUALITY`]; values above 100 are
    /// clamped.
    fn encode(&self, image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError>;
}

/// Map a caller-supplied quality into the 1-100 range.
pub fn normalize_quality(quality: u8) -> u8 {
    if quality == 0 {
        DEFAULT_ENCODE_QUALITY
    } else {
        quality.min(100)
    }
}

/// Reject images whose buffer can't be handed to a codec.
pub(crate) fn validate_image(image: &DecodedImage) -> Result<(), EncodeError> {
    if image.is_empty() {
        return Err(EncodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    let expected = image.expected_len();
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    Ok(())
}
