//! Aspect-preserving resize applied between decode and encode.
//!
//! Three policies are supported, selected by which target dimensions are
//! given:
//!
//! - width only: height follows the source aspect ratio
//! - height only: width follows the source aspect ratio
//! - both: the image is scaled to fit inside the box, using the smaller
//!   of the two scale ratios
//!
//! All computed dimensions are truncated, then clamped to at least 1px.
//! Resampling always uses Catmull-Rom.

use image::imageops::FilterType;

use super::DecodedImage;

/// Interpolation filter used for every resize.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Compute output dimensions for a resize request.
///
/// Returns `None` when neither dimension is requested (a zero value counts
/// as unset), meaning the image should be left untouched.
///
/// When both dimensions are set and the two scale ratios are equal, the
/// width ratio is used; both produce the same result up to truncation.
pub fn target_dimensions(
    src_width: u32,
    src_height: u32,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<(u32, u32)> {
    let width = width.filter(|w| *w > 0);
    let height = height.filter(|h| *h > 0);
    let src_w = src_width.max(1) as f64;
    let src_h = src_height.max(1) as f64;

    let (w, h) = match (width, height) {
        (None, None) => return None,
        (Some(w), None) => (w as f64, src_h * w as f64 / src_w),
        (None, Some(h)) => (src_w * h as f64 / src_h, h as f64),
        (Some(w), Some(h)) => {
            let ratio_w = w as f64 / src_w;
            let ratio_h = h as f64 / src_h;
            let ratio = if ratio_h < ratio_w { ratio_h } else { ratio_w };
            (src_w * ratio, src_h * ratio)
        }
    };

    Some(((w as u32).max(1), (h as u32).max(1)))
}

/// Resize an image according to the requested target dimensions.
///
/// Returns the input unchanged when no dimension is requested or when the
/// computed size equals the current size. Never fails.
pub fn resize(image: DecodedImage, width: Option<u32>, height: Option<u32>) -> DecodedImage {
    let Some((new_width, new_height)) = target_dimensions(image.width, image.height, width, height)
    else {
        return image;
    };

    if (new_width, new_height) == (image.width, image.height) {
        return image;
    }

    let Some(rgba) = image.to_rgba_image() else {
        return image;
    };

    let resized = image::imageops::resize(&rgba, new_width, new_height, RESIZE_FILTER);
    DecodedImage::from_rgba_image(resized)
}
