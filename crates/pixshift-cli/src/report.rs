//! Per-file report lines printed to stdout.

use std::path::Path;

use pixshift_core::{BatchSummary, ConversionOutcome};

const SUCCESS_MARK: &str = "✔";
const FAILURE_MARK: &str = "✘";

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Render a byte count with a binary unit, e.g. `1.5 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// One line describing a finished file.
pub fn outcome_line(outcome: &ConversionOutcome) -> String {
    let input = file_name(&outcome.input_path);

    if let Some(error) = &outcome.error {
        return format!("{} {}: {}", FAILURE_MARK, input, error);
    }

    let output = outcome
        .output_path
        .as_deref()
        .map(file_name)
        .unwrap_or_default();

    match outcome.summary {
        Some(summary) => {
            let mut line = format!(
                "{} {} -> {} (q{}, {})",
                SUCCESS_MARK,
                input,
                output,
                summary.quality,
                format_bytes(summary.bytes)
            );
            if !summary.within_budget {
                line.push_str(" [over budget]");
            }
            line
        }
        None => format!("{} {} -> {}", SUCCESS_MARK, input, output),
    }
}

/// Closing line for a finished batch.
pub fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "Done! Successfully converted {}/{} files.",
        summary.succeeded, summary.total
    )
}
