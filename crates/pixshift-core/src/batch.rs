//! Concurrent batch conversion.
//!
//! A fixed pool of worker threads drains a shared queue of input paths.
//! The queue is filled and closed before any worker starts, so no work is
//! added mid-batch. Each worker runs [`convert`] on one path at a time and
//! sends the outcome on a bounded results channel.
//!
//! Outcomes arrive in completion order, not input order. The results
//! channel disconnects once every worker has exited, which ends iteration
//! on [`BatchConversion`]. A slow consumer only throttles the workers;
//! workers never wait on each other.
//!
//! # Example
//!
//! ```ignore
//! let options = ConvertOptions::new(OutputFormat::Jpg);
//! for outcome in batch_convert(paths, "out", options, 4) {
//!     match outcome.error {
//!         None => println!("ok: {}", outcome.input_path.display()),
//!         Some(e) => println!("failed: {}: {}", outcome.input_path.display(), e),
//!     }
//! }
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info};

use crate::convert::{convert, ConversionOutcome, ConversionRequest, ConvertError, ConvertOptions};

/// Worker count used when the caller has no preference.
pub const DEFAULT_JOBS: usize = 4;

/// Shared flag that stops workers from starting new files.
///
/// Files already being converted finish normally. Every path dequeued
/// after cancellation yields a [`ConvertError::Cancelled`] outcome, so a
/// batch still produces one outcome per input.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Scheduling settings for a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of worker threads. Zero is treated as one.
    pub jobs: usize,
    /// Optional cancellation signal checked between files.
    pub cancel: Option<CancelToken>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            cancel: None,
        }
    }
}

impl BatchOptions {
    pub fn with_jobs(jobs: usize) -> Self {
        Self {
            jobs,
            ..Self::default()
        }
    }
}

/// Counts for a drained batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successful files that still exceed the byte budget.
    pub over_budget: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ConversionOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.succeeded += 1;
            if outcome.is_over_budget() {
                self.over_budget += 1;
            }
        } else {
            self.failed += 1;
        }
    }
}

/// A running batch: a stream of outcomes plus the worker handles.
pub struct BatchConversion {
    results: Receiver<ConversionOutcome>,
    workers: Vec<JoinHandle<()>>,
}

impl BatchConversion {
    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Receive the next outcome, blocking until one is ready.
    ///
    /// Returns `None` once all workers have finished.
    pub fn recv(&self) -> Option<ConversionOutcome> {
        self.results.recv().ok()
    }

    /// Drain any remaining outcomes and join every worker.
    pub fn wait(self) {
        while self.results.recv().is_ok() {}
        // Workers are joined on drop.
    }
}

impl Iterator for BatchConversion {
    type Item = ConversionOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl Drop for BatchConversion {
    fn drop(&mut self) {
        // Unblock workers stuck on a full results channel before joining.
        let (_, disconnected) = bounded(0);
        drop(std::mem::replace(&mut self.results, disconnected));
        join_workers(std::mem::take(&mut self.workers));
    }
}

fn join_workers(workers: Vec<JoinHandle<()>>) {
    for handle in workers {
        if handle.join().is_err() {
            error!("conversion worker panicked");
        }
    }
}

/// Start converting `paths` on a pool of `jobs` workers.
pub fn batch_convert(
    paths: impl IntoIterator<Item = PathBuf>,
    output_dir: impl Into<PathBuf>,
    options: ConvertOptions,
    jobs: usize,
) -> BatchConversion {
    batch_convert_with(paths, output_dir, options, BatchOptions::with_jobs(jobs))
}

/// Start converting `paths` with explicit scheduling options.
pub fn batch_convert_with(
    paths: impl IntoIterator<Item = PathBuf>,
    output_dir: impl Into<PathBuf>,
    options: ConvertOptions,
    batch: BatchOptions,
) -> BatchConversion {
    spawn_batch(paths, output_dir, options, batch, convert)
}

/// Converts one request; the pipeline in production, a stub in tests.
type ConvertFn = fn(&ConversionRequest) -> ConversionOutcome;

fn spawn_batch(
    paths: impl IntoIterator<Item = PathBuf>,
    output_dir: impl Into<PathBuf>,
    options: ConvertOptions,
    batch: BatchOptions,
    convert: ConvertFn,
) -> BatchConversion {
    let paths: Vec<PathBuf> = paths.into_iter().collect();
    let jobs = batch.jobs.max(1);
    let output_dir: PathBuf = output_dir.into();
    let options = Arc::new(options);

    info!(
        files = paths.len(),
        jobs,
        format = %options.format,
        output = %output_dir.display(),
        "starting batch"
    );

    let (task_tx, task_rx) = bounded::<PathBuf>(paths.len().max(1));
    for path in paths {
        // Capacity covers every path and the receiver is alive.
        let _ = task_tx.send(path);
    }
    drop(task_tx);

    let (result_tx, result_rx) = bounded::<ConversionOutcome>(jobs);

    let workers = (0..jobs)
        .filter_map(|id| {
            let worker = Worker {
                id,
                tasks: task_rx.clone(),
                results: result_tx.clone(),
                output_dir: output_dir.clone(),
                options: Arc::clone(&options),
                cancel: batch.cancel.clone(),
                convert,
            };
            thread::Builder::new()
                .name(format!("pixshift-worker-{}", id))
                .spawn(move || worker.run())
                .map_err(|e| error!(worker = id, error = %e, "failed to spawn worker"))
                .ok()
        })
        .collect::<Vec<_>>();
    // Only workers hold senders, so the stream ends when the last one exits.
    drop(result_tx);

    if workers.is_empty() {
        // No thread could be spawned; drain the queue on this thread so the
        // consumer still sees one outcome per path.
        let (inline_tx, inline_rx) = crossbeam_channel::unbounded();
        Worker {
            id: 0,
            tasks: task_rx,
            results: inline_tx,
            output_dir,
            options,
            cancel: batch.cancel,
            convert,
        }
        .run();
        return BatchConversion {
            results: inline_rx,
            workers: Vec::new(),
        };
    }

    BatchConversion {
        results: result_rx,
        workers,
    }
}

/// Drain a batch, calling `report` once per outcome, and join the workers.
pub fn run_batch(
    paths: impl IntoIterator<Item = PathBuf>,
    output_dir: impl Into<PathBuf>,
    options: ConvertOptions,
    batch: BatchOptions,
    mut report: impl FnMut(&ConversionOutcome),
) -> BatchSummary {
    let conversion = batch_convert_with(paths, output_dir, options, batch);
    let mut summary = BatchSummary::default();

    while let Some(outcome) = conversion.recv() {
        summary.record(&outcome);
        report(&outcome);
    }
    conversion.wait();

    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        over_budget = summary.over_budget,
        "batch finished"
    );
    summary
}

struct Worker {
    id: usize,
    tasks: Receiver<PathBuf>,
    results: Sender<ConversionOutcome>,
    output_dir: PathBuf,
    options: Arc<ConvertOptions>,
    cancel: Option<CancelToken>,
    convert: ConvertFn,
}

impl Worker {
    fn run(self) {
        debug!(worker = self.id, "worker started");
        let mut processed = 0usize;

        while let Ok(path) = self.tasks.recv() {
            let cancelled = self.cancel.as_ref().is_some_and(CancelToken::is_cancelled);
            let outcome = if cancelled {
                ConversionOutcome::failure(path, ConvertError::Cancelled)
            } else {
                let request =
                    ConversionRequest::new(path, self.output_dir.clone(), Arc::clone(&self.options));
                self.convert_isolated(request)
            };
            processed += 1;

            if self.results.send(outcome).is_err() {
                debug!(worker = self.id, "results receiver dropped, stopping");
                break;
            }
        }

        debug!(worker = self.id, processed, "worker finished");
    }

    /// Run one conversion, turning a codec panic into a failed outcome so
    /// the worker keeps draining the queue.
    fn convert_isolated(&self, request: ConversionRequest) -> ConversionOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.convert)(&request))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    worker = self.id,
                    input = %request.input_path.display(),
                    %message,
                    "conversion panicked"
                );
                ConversionOutcome::failure(request.input_path, ConvertError::Panicked(message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
