//! Pixshift - batch image converter.
//!
//! This binary discovers input images, converts them on a worker pool and
//! prints one line per file followed by a summary.

mod config;
mod report;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use pixshift_core::{discover_images, run_batch, BatchOptions};

fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let options = match config.convert_options() {
        Ok(options) => options,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let files = match discover_images(&config.input) {
        Ok(files) => files,
        Err(e) => {
            error!("Error finding files in {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if files.is_empty() {
        println!("No supported image files found.");
        return ExitCode::SUCCESS;
    }

    info!(
        "Converting {} files to {} (quality: {}, workers: {})",
        files.len(),
        options.format,
        options.quality,
        config.jobs
    );

    let summary = run_batch(
        files,
        &config.output,
        options,
        BatchOptions::with_jobs(config.jobs),
        |outcome| println!("{}", report::outcome_line(outcome)),
    );

    println!();
    println!("{}", report::summary_line(&summary));

    if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "pixshift=debug,pixshift_core=debug"
    } else {
        "pixshift=info,pixshift_core=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
