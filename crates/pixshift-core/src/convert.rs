//! Single-file conversion pipeline.
//!
//! Each conversion runs these steps on the calling thread:
//!
//! 1. Decode the source file
//! 2. Resize, if a width or height was requested
//! 3. Create the output directory
//! 4. Derive the output path and refuse to clobber it unless `overwrite`
//! 5. Encode within the size budget
//! 6. Write the result via a temp file renamed into place
//!
//! Every failure ends up in the returned [`ConversionOutcome`]; nothing
//! escapes to the caller as an `Err`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::decode::{self, DecodeError};
use crate::encode::{self, EncodeError};
use crate::format::{FormatError, OutputFormat};
use crate::size::SizeParseError;

/// Default quality for new conversions.
pub const DEFAULT_QUALITY: u8 = 80;

/// Why a single file failed to convert.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source could not be read or decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The codec rejected the image.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// Creating the output directory or writing the file failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output file exists and overwriting is disabled.
    #[error("file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// The requested format is not supported.
    #[error(transparent)]
    UnsupportedFormat(#[from] FormatError),

    /// A configuration value (such as a size string) was malformed.
    #[error("invalid configuration: {0}")]
    Config(#[from] SizeParseError),

    /// The batch was cancelled before this file was started.
    #[error("cancelled before conversion started")]
    Cancelled,

    /// A codec panicked while converting this file.
    #[error("conversion panicked: {0}")]
    Panicked(String),
}

impl ConvertError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Settings shared by every file in a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Target format.
    pub format: OutputFormat,
    /// Starting quality, 0-100. 0 selects the encoder default.
    pub quality: u8,
    /// Replace existing output files.
    pub overwrite: bool,
    /// Byte budget per output file.
    pub max_output_bytes: Option<u64>,
    /// Target width in pixels.
    pub width: Option<u32>,
    /// Target height in pixels.
    pub height: Option<u32>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: DEFAULT_QUALITY,
            overwrite: false,
            max_output_bytes: None,
            width: None,
            height: None,
        }
    }
}

impl ConvertOptions {
    /// Options for `format` with every other setting at its default.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Whether a resize was requested.
    pub fn wants_resize(&self) -> bool {
        self.width.is_some_and(|w| w > 0) || self.height.is_some_and(|h| h > 0)
    }
}

/// One file to convert.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Source image.
    pub input_path: PathBuf,
    /// Directory the output file is written into.
    pub output_dir: PathBuf,
    /// Shared, read-only settings.
    pub options: Arc<ConvertOptions>,
}

impl ConversionRequest {
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        options: Arc<ConvertOptions>,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            options,
        }
    }

    /// Where this request's output will be written.
    pub fn output_path(&self) -> PathBuf {
        output_path_for(&self.input_path, &self.output_dir, self.options.format)
    }
}

/// Details of the final encode of a successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Quality of the written encode.
    pub quality: u8,
    /// Encode attempts made by the budget loop.
    pub attempts: u32,
    /// Bytes written.
    pub bytes: u64,
    /// False when a budget was set and could not be met.
    pub within_budget: bool,
}

/// Terminal result for one input file.
///
/// On success `output_path` and `summary` are set. On failure `error` is
/// set; `output_path` is also set for [`ConvertError::AlreadyExists`] so
/// callers can report the conflicting path.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub error: Option<ConvertError>,
    pub summary: Option<EncodeSummary>,
}

impl ConversionOutcome {
    fn success(input_path: PathBuf, output_path: PathBuf, summary: EncodeSummary) -> Self {
        Self {
            input_path,
            output_path: Some(output_path),
            error: None,
            summary: Some(summary),
        }
    }

    pub(crate) fn failure(input_path: PathBuf, error: ConvertError) -> Self {
        let output_path = match &error {
            ConvertError::AlreadyExists { path } => Some(path.clone()),
            _ => None,
        };
        Self {
            input_path,
            output_path,
            error: Some(error),
            summary: None,
        }
    }

    /// True when the file was written.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True when the file was written but still exceeds the budget.
    pub fn is_over_budget(&self) -> bool {
        self.summary.is_some_and(|s| !s.within_budget)
    }
}

/// Output path for an input: `{output_dir}/{input_stem}.{ext}`.
///
/// Independent of quality and resize settings.
pub fn output_path_for(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(format.extension());
    output_dir.join(name)
}

/// Convert one file.
pub fn convert(request: &ConversionRequest) -> ConversionOutcome {
    match run(request) {
        Ok((output_path, summary)) => {
            debug!(
                input = %request.input_path.display(),
                output = %output_path.display(),
                quality = summary.quality,
                bytes = summary.bytes,
                "converted"
            );
            ConversionOutcome::success(request.input_path.clone(), output_path, summary)
        }
        Err(error) => {
            warn!(input = %request.input_path.display(), %error, "conversion failed");
            ConversionOutcome::failure(request.input_path.clone(), error)
        }
    }
}

/// Convert one file with the given options.
pub fn convert_file(
    input_path: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
    options: &ConvertOptions,
) -> ConversionOutcome {
    convert(&ConversionRequest::new(
        input_path,
        output_dir,
        Arc::new(options.clone()),
    ))
}

fn run(request: &ConversionRequest) -> Result<(PathBuf, EncodeSummary), ConvertError> {
    let options = request.options.as_ref();

    let mut image = decode::decode_file(&request.input_path)?;
    debug!(
        input = %request.input_path.display(),
        width = image.width,
        height = image.height,
        "decoded"
    );

    if options.wants_resize() {
        image = decode::resize(image, options.width, options.height);
        debug!(width = image.width, height = image.height, "resized");
    }

    std::fs::create_dir_all(&request.output_dir)
        .map_err(|e| ConvertError::io(&request.output_dir, e))?;

    let output_path = request.output_path();
    if !options.overwrite && output_path.exists() {
        return Err(ConvertError::AlreadyExists { path: output_path });
    }

    let encoder = encode::encoder_for(options.format);
    let encoded = encode::encode_within_budget(
        encoder.as_ref(),
        &image,
        options.quality,
        options.max_output_bytes,
    )?;
    drop(image);

    write_atomic(
        &request.output_dir,
        &output_path,
        &encoded.bytes,
        options.overwrite,
    )?;

    Ok((
        output_path,
        EncodeSummary {
            quality: encoded.quality,
            attempts: encoded.attempts,
            bytes: encoded.bytes.len() as u64,
            within_budget: encoded.within_budget,
        },
    ))
}

/// Write to a temp file in `dir`, then move it onto `path`.
///
/// Without `overwrite` the move fails if `path` appeared since the
/// existence check, so two workers sharing an output name cannot clobber
/// each other. A failure at any point leaves `path` untouched.
fn write_atomic(
    dir: &Path,
    path: &Path,
    bytes: &[u8],
    overwrite: bool,
) -> Result<(), ConvertError> {
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ConvertError::io(dir, e))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file_mut().sync_all())
        .map_err(|e| ConvertError::io(temp.path(), e))?;

    let persisted = if overwrite {
        temp.persist(path)
    } else {
        temp.persist_noclobber(path)
    };
    persisted.map_err(|e| match e.error.kind() {
        std::io::ErrorKind::AlreadyExists if !overwrite => ConvertError::AlreadyExists {
            path: path.to_path_buf(),
        },
        _ => ConvertError::io(path, e.error),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 7) as u8, (y * 5) as u8, ((x ^ y) * 3) as u8]);
            }
        }
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
            .unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_output_path_is_deterministic() {
        let out = Path::new("/out");
        assert_eq!(
            output_path_for(Path::new("/in/photo.jpeg"), out, OutputFormat::WebP),
            PathBuf::from("/out/photo.webp")
        );
        assert_eq!(
            output_path_for(Path::new("archive.tar.png"), out, OutputFormat::Jpg),
            PathBuf::from("/out/archive.tar.jpg")
        );
        assert_eq!(
            output_path_for(Path::new("noext"), out, OutputFormat::Avif),
            PathBuf::from("/out/noext.avif")
        );
    }

    #[test]
    fn test_options_default() {
        let options = ConvertOptions::default();
        assert_eq!(options.quality, 80);
        assert_eq!(options.format, OutputFormat::WebP);
        assert!(!options.overwrite);
        assert!(!options.wants_resize());
    }

    #[test]
    fn test_options_from_json() {
        let options: ConvertOptions =
            serde_json::from_str(r#"{"format": "jpeg", "max_output_bytes": 204800}"#).unwrap();

        assert_eq!(options.format, OutputFormat::Jpg);
        assert_eq!(options.quality, DEFAULT_QUALITY);
        assert_eq!(options.max_output_bytes, Some(204_800));
        assert!(!options.overwrite);

        let empty: ConvertOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ConvertOptions::default());
    }

    #[test]
    fn test_options_serialize_lowercase_format() {
        let mut options = ConvertOptions::new(OutputFormat::WebP);
        options.width = Some(640);

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["format"], "webp");
        assert_eq!(json["width"], 640);

        let back: ConvertOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_convert_png_to_jpg() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "test.png", 10, 10);
        let out_dir = dir.path().join("output");

        let outcome = convert_file(&input, &out_dir, &ConvertOptions::new(OutputFormat::Jpg));

        assert!(outcome.is_success(), "{:?}", outcome.error);
        let output = outcome.output_path.unwrap();
        assert_eq!(output, out_dir.join("test.jpg"));
        let written = std::fs::read(&output).unwrap();
        assert_eq!(&written[0..2], &[0xFF, 0xD8]);

        let summary = outcome.summary.unwrap();
        assert_eq!(summary.bytes, written.len() as u64);
        assert_eq!(summary.attempts, 1);
        assert!(summary.within_budget);
    }

    #[test]
    fn test_avif_output_converts_back_to_jpg() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "photo.png", 24, 16);
        let avif_dir = dir.path().join("avif");

        let first = convert_file(&input, &avif_dir, &ConvertOptions::new(OutputFormat::Avif));
        assert!(first.is_success(), "{:?}", first.error);

        let avif = first.output_path.unwrap();
        let jpg_dir = dir.path().join("jpg");
        let second = convert_file(&avif, &jpg_dir, &ConvertOptions::new(OutputFormat::Jpg));
        assert!(second.is_success(), "{:?}", second.error);

        let decoded = decode::decode_file(&jpg_dir.join("photo.jpg")).unwrap();
        assert_eq!((decoded.width, decoded.height), (24, 16));
    }

    #[test]
    fn test_convert_every_format() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "test.png", 12, 8);
        let out_dir = dir.path().join("output");

        for format in OutputFormat::ALL {
            let outcome = convert_file(&input, &out_dir, &ConvertOptions::new(format));
            assert!(outcome.is_success(), "{}: {:?}", format, outcome.error);
            assert!(out_dir.join(format!("test.{}", format.extension())).exists());
        }
    }

    #[test]
    fn test_convert_with_resize() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "wide.png", 100, 200);
        let out_dir = dir.path().join("output");

        let mut options = ConvertOptions::new(OutputFormat::Png);
        options.width = Some(40);
        options.height = Some(100);

        let outcome = convert_file(&input, &out_dir, &options);
        assert!(outcome.is_success(), "{:?}", outcome.error);

        let resized = decode::decode_file(&outcome.output_path.unwrap()).unwrap();
        assert_eq!((resized.width, resized.height), (40, 80));
    }

    #[test]
    fn test_existing_output_is_not_touched() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "test.png", 10, 10);
        let out_dir = dir.path().join("output");
        std::fs::create_dir_all(&out_dir).unwrap();
        let existing = out_dir.join("test.jpg");
        std::fs::write(&existing, b"keep me").unwrap();

        let outcome = convert_file(&input, &out_dir, &ConvertOptions::new(OutputFormat::Jpg));

        assert!(matches!(outcome.error, Some(ConvertError::AlreadyExists { .. })));
        assert_eq!(outcome.output_path.as_deref(), Some(existing.as_path()));
        assert!(outcome.summary.is_none());
        assert_eq!(std::fs::read(&existing).unwrap(), b"keep me");
    }

    #[test]
    fn test_overwrite_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "test.png", 10, 10);
        let out_dir = dir.path().join("output");
        std::fs::create_dir_all(&out_dir).unwrap();
        let existing = out_dir.join("test.png");
        std::fs::write(&existing, b"stale").unwrap();

        let mut options = ConvertOptions::new(OutputFormat::Png);
        options.overwrite = true;
        let outcome = convert_file(&input, &out_dir, &options);

        assert!(outcome.is_success(), "{:?}", outcome.error);
        assert_ne!(std::fs::read(&existing).unwrap(), b"stale");
    }

    #[test]
    fn test_corrupt_input_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.jpg");
        std::fs::write(&input, b"not an image at all").unwrap();

        let outcome = convert_file(&input, dir.path().join("output"), &ConvertOptions::default());

        assert!(matches!(outcome.error, Some(ConvertError::Decode(_))));
        assert!(outcome.output_path.is_none());
        assert!(!dir.path().join("output").join("broken.webp").exists());
    }

    #[test]
    fn test_write_without_overwrite_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("x.png");
        std::fs::write(&target, b"first").unwrap();

        let err = write_atomic(dir.path(), &target, b"second", false).unwrap_err();

        assert!(matches!(err, ConvertError::AlreadyExists { ref path } if path == &target));
        assert_eq!(std::fs::read(&target).unwrap(), b"first");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_with_overwrite_replaces_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("x.png");
        std::fs::write(&target, b"first").unwrap();

        write_atomic(dir.path(), &target, b"second", true).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"second");
    }

    #[test]
    fn test_output_dir_blocked_by_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "test.png", 4, 4);
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"file, not dir").unwrap();

        let outcome = convert_file(&input, &blocker, &ConvertOptions::default());

        assert!(matches!(outcome.error, Some(ConvertError::Io { .. })));
    }

    #[test]
    fn test_unreachable_budget_still_writes() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "noisy.png", 64, 64);
        let out_dir = dir.path().join("output");

        let mut options = ConvertOptions::new(OutputFormat::Jpg);
        options.max_output_bytes = Some(1);
        let outcome = convert_file(&input, &out_dir, &options);

        assert!(outcome.is_success(), "{:?}", outcome.error);
        assert!(outcome.is_over_budget());
        let summary = outcome.summary.unwrap();
        assert_eq!(summary.quality, encode::QUALITY_FLOOR);
        assert_eq!(summary.attempts, encode::max_attempts(80));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "test.png", 8, 8);
        let out_dir = dir.path().join("output");

        let outcome = convert_file(&input, &out_dir, &ConvertOptions::new(OutputFormat::Png));
        assert!(outcome.is_success());

        let entries: Vec<_> = std::fs::read_dir(&out_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_error_messages() {
        let err = ConvertError::AlreadyExists {
            path: PathBuf::from("/out/a.jpg"),
        };
        assert_eq!(err.to_string(), "file already exists: /out/a.jpg");
        assert_eq!(
            ConvertError::from(FormatError::Unsupported("bmp".into())).to_string(),
            "unsupported format: bmp"
        );
    }
}
