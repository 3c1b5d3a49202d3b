//! Output encoding for the conversion pipeline.
//!
//! This module provides functionality for:
//! - One [`ImageEncoder`] implementation per [`OutputFormat`]
//! - Budgeted encoding that lowers quality until the output fits
//!
//! All encoders are synchronous and stateless; a single instance can be
//! shared between worker threads.
//!
//! # Examples
//!
//! ```ignore
//! use pixshift_core::encode::{encode_within_budget, encoder_for};
//! use pixshift_core::OutputFormat;
//!
//! let encoder = encoder_for(OutputFormat::WebP);
//! let result = encode_within_budget(encoder.as_ref(), &image, 80, Some(200 * 1024))?;
//! println!("Encoded {} bytes at quality {}", result.bytes.len(), result.quality);
//! ```

mod avif;
mod budget;
mod jpeg;
mod png;
mod types;
mod webp;

pub use avif::{AvifEncoder, AVIF_SPEED};
pub use budget::{encode_within_budget, max_attempts, BudgetedEncode, QUALITY_FLOOR, QUALITY_STEP};
pub use jpeg::JpegEncoder;
pub use png::{compression_for_quality, PngEncoder};
pub use types::{normalize_quality, EncodeError, ImageEncoder, DEFAULT_ENCODE_QUALITY};
pub use self::webp::WebPEncoder;

use crate::format::OutputFormat;

/// Select the encoder implementation for a format.
pub fn encoder_for(format: OutputFormat) -> Box<dyn ImageEncoder> {
    match format {
        OutputFormat::Jpg => Box::new(JpegEncoder),
        OutputFormat::Png => Box::new(PngEncoder),
        OutputFormat::WebP => Box::new(WebPEncoder),
        OutputFormat::Avif => Box::new(AvifEncoder),
    }
}
