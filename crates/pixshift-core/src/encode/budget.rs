//! Size-constrained encoding.
//!
//! Re-encodes at decreasing quality until the output fits a byte budget or
//! the quality floor is reached. Quality only ever goes down, in steps of
//! [`QUALITY_STEP`], and never below [`QUALITY_FLOOR`], so the loop runs at
//! most `ceil((quality - 10) / 5) + 1` times.
//!
//! Hitting the floor while still over budget is not an error: the last
//! encode is returned with `within_budget == false`.

use tracing::{debug, warn};

use super::{EncodeError, ImageEncoder};
use crate::decode::DecodedImage;

/// Lowest quality the loop will try.
pub const QUALITY_FLOOR: u8 = 10;

/// Quality decrement between attempts.
pub const QUALITY_STEP: u8 = 5;

/// Final result of [`encode_within_budget`].
#[derive(Debug, Clone)]
pub struct BudgetedEncode {
    /// Encoded bytes of the last attempt.
    pub bytes: Vec<u8>,
    /// Quality used for the last attempt.
    pub quality: u8,
    /// Number of encode calls made.
    pub attempts: u32,
    /// False when the budget was set and still exceeded at the floor.
    pub within_budget: bool,
}

/// Upper bound on encode attempts for a starting quality.
pub fn max_attempts(quality: u8) -> u32 {
    let above_floor = quality.saturating_sub(QUALITY_FLOOR) as u32;
    above_floor.div_ceil(QUALITY_STEP as u32) + 1
}

/// Encode `image`, lowering quality until the output fits `max_bytes`.
///
/// A `max_bytes` of `None` or `Some(0)` means no budget: exactly one
/// encode happens at the requested quality.
///
/// # Errors
///
/// The first encoder error aborts the loop and is returned unchanged.
pub fn encode_within_budget(
    encoder: &dyn ImageEncoder,
    image: &DecodedImage,
    quality: u8,
    max_bytes: Option<u64>,
) -> Result<BudgetedEncode, EncodeError> {
    let budget = max_bytes.filter(|b| *b > 0);
    let mut current = quality;
    let mut attempts = 0u32;

    loop {
        let bytes = encoder.encode(image, current)?;
        attempts += 1;
        let size = bytes.len() as u64;

        debug!(
            format = %encoder.format(),
            quality = current,
            size,
            attempt = attempts,
            "encode attempt"
        );

        let fits = budget.map_or(true, |limit| size <= limit);
        if fits || current <= QUALITY_FLOOR {
            if !fits {
                warn!(
                    format = %encoder.format(),
                    size,
                    budget = budget.unwrap_or_default(),
                    "output still exceeds budget at quality floor"
                );
            }
            return Ok(BudgetedEncode {
                bytes,
                quality: current,
                attempts,
                within_budget: fits,
            });
        }

        current = current.saturating_sub(QUALITY_STEP).max(QUALITY_FLOOR);
    }
}
