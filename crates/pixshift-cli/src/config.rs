//! Command-line configuration for Pixshift.
//!
//! Every option except the input path can also be set through an
//! environment variable with the `PIXSHIFT_` prefix:
//!
//! - `PIXSHIFT_OUTPUT` - Output directory (default: ./output)
//! - `PIXSHIFT_FORMAT` - Output format: jpg, png, webp, avif (default: webp)
//! - `PIXSHIFT_QUALITY` - Encode quality 0-100 (default: 80)
//! - `PIXSHIFT_JOBS` - Number of worker threads (default: 4)
//! - `PIXSHIFT_OVERWRITE` - Replace existing outputs (default: false)
//! - `PIXSHIFT_MAX_SIZE` - Byte budget per output, e.g. `200kb`
//! - `PIXSHIFT_WIDTH` / `PIXSHIFT_HEIGHT` - Resize bounds in pixels
//! - `PIXSHIFT_VERBOSE` - Enable debug logging

use std::path::PathBuf;

use clap::Parser;
use pixshift_core::{parse_size, ConvertOptions, OutputFormat, DEFAULT_JOBS, DEFAULT_QUALITY};

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Pixshift - fast batch image conversion.
///
/// Converts a single image or every image under a directory to JPEG, PNG,
/// WebP or AVIF, with optional resizing and a per-file size budget.
#[derive(Parser, Debug, Clone)]
#[command(name = "pixshift")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Input file or directory.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, env = "PIXSHIFT_OUTPUT")]
    pub output: PathBuf,

    /// Output format (jpg, png, webp, avif).
    #[arg(short, long, default_value_t = OutputFormat::WebP, env = "PIXSHIFT_FORMAT")]
    pub format: OutputFormat,

    /// Image quality (0-100).
    #[arg(short, long, default_value_t = DEFAULT_QUALITY, env = "PIXSHIFT_QUALITY")]
    pub quality: u8,

    /// Number of concurrent jobs.
    #[arg(short, long, default_value_t = DEFAULT_JOBS, env = "PIXSHIFT_JOBS")]
    pub jobs: usize,

    /// Overwrite existing files.
    #[arg(long, env = "PIXSHIFT_OVERWRITE")]
    pub overwrite: bool,

    /// Maximum output size per file, e.g. `500`, `200kb`, `1.5mb`.
    ///
    /// Quality is lowered in steps until the output fits.
    #[arg(long, env = "PIXSHIFT_MAX_SIZE")]
    pub max_size: Option<String>,

    /// Maximum output width in pixels.
    #[arg(long, env = "PIXSHIFT_WIDTH")]
    pub width: Option<u32>,

    /// Maximum output height in pixels.
    #[arg(long, env = "PIXSHIFT_HEIGHT")]
    pub height: Option<u32>,

    /// Enable verbose (debug) logging.
    #[arg(short, long, env = "PIXSHIFT_VERBOSE")]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration.
    ///
    /// Returns an error message if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.quality > 100 {
            return Err("quality must be between 0 and 100".to_string());
        }

        if self.jobs == 0 {
            return Err("jobs must be greater than 0".to_string());
        }

        if self.width == Some(0) {
            return Err("width must be greater than 0".to_string());
        }
        if self.height == Some(0) {
            return Err("height must be greater than 0".to_string());
        }

        self.max_output_bytes()?;

        Ok(())
    }

    /// Parsed `--max-size`, if one was given.
    pub fn max_output_bytes(&self) -> Result<Option<u64>, String> {
        self.max_size
            .as_deref()
            .map(|s| parse_size(s).map_err(|e| format!("invalid max size '{}': {}", s, e)))
            .transpose()
    }

    /// Build the per-file conversion options.
    pub fn convert_options(&self) -> Result<ConvertOptions, String> {
        Ok(ConvertOptions {
            format: self.format,
            quality: self.quality,
            overwrite: self.overwrite,
            max_output_bytes: self.max_output_bytes()?,
            width: self.width,
            height: self.height,
        })
    }
}
