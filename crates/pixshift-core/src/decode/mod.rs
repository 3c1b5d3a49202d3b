//! Image decoding and resizing for the conversion pipeline.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG, GIF and WebP sources into an RGBA buffer
//! - Applying EXIF orientation so outputs are upright
//! - Aspect-preserving resize with a fixed interpolation filter
//!
//! # Examples
//!
//! ```ignore
//! use pixshift_core::decode::{decode_file, resize};
//!
//! let image = decode_file(Path::new("photo.jpg"))?;
//! let thumb = resize(image, Some(320), None);
//! println!("Resized to {}x{}", thumb.width, thumb.height);
//! ```

mod file;
mod resize;
mod types;

pub use file::{decode_bytes, decode_file};
pub use resize::{resize, target_dimensions, RESIZE_FILTER};
pub use types::{DecodeError, DecodedImage, Orientation};
