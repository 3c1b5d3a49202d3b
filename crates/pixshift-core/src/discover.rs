//! Input discovery for batch runs.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions picked up when walking a directory.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "avif", "gif"];

/// Whether `path` has one of [`IMAGE_EXTENSIONS`], ignoring case.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Collect the images to convert under `path`.
///
/// A file path is returned as-is, whatever its extension. A directory is
/// walked recursively and only image files are kept, sorted by path.
/// Unreadable entries below the root are skipped with a warning.
///
/// # Errors
///
/// Fails when `path` itself does not exist or cannot be read.
pub fn discover_images(path: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)?;

    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_image_path(entry.path()) {
            images.push(entry.into_path());
        }
    }
    images.sort();

    debug!(root = %path.display(), count = images.len(), "discovered images");
    Ok(images)
}
