//! Pixshift Core - batch image conversion library
//!
//! This crate converts raster images between JPEG, PNG, WebP and AVIF,
//! optionally resizing them and lowering encode quality until each output
//! fits a byte budget. Batches run on a fixed pool of worker threads and
//! report one outcome per input file.

pub mod batch;
pub mod convert;
pub mod decode;
pub mod discover;
pub mod encode;
pub mod format;
pub mod size;

pub use batch::{
    batch_convert, batch_convert_with, run_batch, BatchConversion, BatchOptions, BatchSummary,
    CancelToken, DEFAULT_JOBS,
};
pub use convert::{
    convert, convert_file, output_path_for, ConversionOutcome, ConversionRequest, ConvertError,
    ConvertOptions, EncodeSummary, DEFAULT_QUALITY,
};
pub use discover::{discover_images, is_image_path, IMAGE_EXTENSIONS};
pub use format::{FormatError, OutputFormat};
pub use size::{parse_size, SizeParseError};
