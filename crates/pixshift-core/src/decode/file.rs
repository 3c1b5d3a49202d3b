//! Source image decoding with EXIF orientation handling.
//!
//! The container format is sniffed from the file contents rather than the
//! extension, so a mislabeled `.jpg` that is really a PNG still decodes.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageError, ImageReader};
use tracing::debug;

use super::{DecodeError, DecodedImage, Orientation};

/// Read and decode an image file from disk.
///
/// # Errors
///
/// Returns `DecodeError::Io` if the file cannot be read, otherwise the
/// errors of [`decode_bytes`].
pub fn decode_file(path: &Path) -> Result<DecodedImage, DecodeError> {
    let bytes = std::fs::read(path).map_err(|e| DecodeError::Io(e.to_string()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read source image");
    decode_bytes(&bytes)
}

/// Decode an in-memory image, applying EXIF orientation correction.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not a recognized
/// image format, or `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader.decode().map_err(|e| match e {
        ImageError::Unsupported(_) => DecodeError::InvalidFormat,
        other => DecodeError::CorruptedFile(other.to_string()),
    })?;

    let oriented = apply_orientation(img, orientation);
    Ok(DecodedImage::from_rgba_image(oriented.into_rgba8()))
}

/// Extract EXIF orientation from image bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
