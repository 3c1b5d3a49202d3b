//! Output formats supported by the conversion pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a format name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The requested output format is not one of jpg, png, webp or avif.
    #[error("unsupported format: {0}")]
    Unsupported(String),
}

/// Target format for converted images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Baseline JPEG (lossy).
    #[serde(alias = "jpeg")]
    Jpg,
    /// PNG (lossless, quality selects compression effort).
    Png,
    /// Lossy WebP.
    #[default]
    WebP,
    /// AVIF (AV1 still image).
    Avif,
}

impl OutputFormat {
    /// All formats, in the order they are listed to users.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Jpg,
        OutputFormat::Png,
        OutputFormat::WebP,
        OutputFormat::Avif,
    ];

    /// File extension (without the leading dot) used for output files.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "avif" => Ok(OutputFormat::Avif),
            _ => Err(FormatError::Unsupported(s.to_string())),
        }
    }
}
