//! Human-readable byte size parsing.
//!
//! Accepts strings such as `"200kb"`, `"1.5mb"`, `"500b"` or a plain byte
//! count like `"100"`. Parsing is case-insensitive and tolerates whitespace
//! around the value and between the number and the unit. Units are binary:
//! `kb` is 1024 bytes and `mb` is 1024 * 1024 bytes.

use thiserror::Error;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Errors produced by [`parse_size`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeParseError {
    /// The input was empty or only whitespace.
    #[error("size string is empty")]
    Empty,

    /// The input did not match `<number>[unit]`.
    #[error("invalid size format: {0}")]
    Invalid(String),
}

/// Parse a size string into a byte count.
///
/// Fractional values are truncated after applying the unit multiplier, so
/// `"1.5mb"` yields `1572864`.
///
/// # Errors
///
/// Returns [`SizeParseError::Empty`] for blank input and
/// [`SizeParseError::Invalid`] when the number or unit is malformed.
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let normalized = input.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(SizeParseError::Empty);
    }

    let invalid = || SizeParseError::Invalid(normalized.clone());

    let split = normalized
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(normalized.len());
    let (number, unit) = normalized.split_at(split);

    if number.is_empty() {
        return Err(invalid());
    }

    let multiplier = match unit.trim_start() {
        "" | "b" => 1.0,
        "kb" => KIB,
        "mb" => MIB,
        _ => return Err(invalid()),
    };

    let value: f64 = number.parse().map_err(|_| invalid())?;

    Ok((value * multiplier) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_size("200kb"), Ok(200 * 1024));
        assert_eq!(parse_size("1mb"), Ok(1024 * 1024));
        assert_eq!(parse_size("1.5mb"), Ok(1_572_864));
        assert_eq!(parse_size("500b"), Ok(500));
        assert_eq!(parse_size("100"), Ok(100));
    }

    #[test]
    fn test_parse_case_and_whitespace() {
        assert_eq!(parse_size(" 200 KB "), Ok(200 * 1024));
        assert_eq!(parse_size("2MB"), Ok(2 * 1024 * 1024));
        assert_eq!(parse_size("\t64\tb\n"), Ok(64));
    }

    #[test]
    fn test_fraction_is_truncated() {
        assert_eq!(parse_size("1.7b"), Ok(1));
        assert_eq!(parse_size("0.5kb"), Ok(512));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_size(""), Err(SizeParseError::Empty));
        assert_eq!(parse_size("   "), Err(SizeParseError::Empty));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(parse_size("abc"), Err(SizeParseError::Invalid(_))));
        assert!(matches!(parse_size("kb"), Err(SizeParseError::Invalid(_))));
        assert!(matches!(parse_size("10gb"), Err(SizeParseError::Invalid(_))));
        assert!(matches!(parse_size("1.2.3mb"), Err(SizeParseError::Invalid(_))));
        assert!(matches!(parse_size("-5kb"), Err(SizeParseError::Invalid(_))));
        assert!(matches!(parse_size("5 k b"), Err(SizeParseError::Invalid(_))));
    }

    #[test]
    fn test_error_display() {
        let err = parse_size("abc").unwrap_err();
        assert_eq!(err.to_string(), "invalid size format: abc");
    }
}
