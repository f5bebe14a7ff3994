//! Batch processor: probe, convert, clean up, one file at a time.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::converter::{ConversionJob, Converter};
use crate::scanner::CandidateFile;

use super::config::ScanConfig;
use super::types::{BatchReport, BatchStats, FileOutcome, RatingLabel, RunStatus, SkipReason};

/// Drives candidates through the converter sequentially.
///
/// At most one file is in flight at any time. Cancellation is only
/// observed between files, so a file that has started is always finished,
/// including its cleanup.
pub struct BatchProcessor<C: Converter> {
    converter: Arc<C>,
    dry_run: bool,
}

impl<C: Converter> BatchProcessor<C> {
    /// Creates a new batch processor.
    pub fn new(converter: C, config: &ScanConfig) -> Self {
        Self {
            converter: Arc::new(converter),
            dry_run: config.dry_run,
        }
    }

    /// Processes every candidate, stopping early if `cancel` fires.
    pub async fn run<I>(&self, files: I, cancel: &CancellationToken) -> BatchReport
    where
        I: IntoIterator<Item = CandidateFile>,
    {
        self.run_with(files, cancel, |_| {}).await
    }

    /// Like [`run`](Self::run), handing each file's outcome to `on_outcome`
    /// as soon as the file is done.
    pub async fn run_with<I, F>(&self, files: I, cancel: &CancellationToken, mut on_outcome: F) -> BatchReport
    where
        I: IntoIterator<Item = CandidateFile>,
        F: FnMut(FileOutcome),
    {
        let mut stats = BatchStats::default();

        for file in files {
            let outcome = self.process_file(&file).await;
            stats.record(&outcome);
            on_outcome(outcome);

            if cancel.is_cancelled() {
                info!("Exiting...");
                return BatchReport {
                    status: RunStatus::Interrupted,
                    stats,
                };
            }
        }

        BatchReport {
            status: RunStatus::Completed,
            stats,
        }
    }

    /// Handles one candidate from probe to cleanup.
    pub async fn process_file(&self, file: &CandidateFile) -> FileOutcome {
        let path = file.path.as_path();

        let report = match self.converter.probe(path).await {
            Ok(report) => report,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Probe failed, skipping");
                return FileOutcome::Skipped {
                    reason: SkipReason::ProbeFailed(e.to_string()),
                };
            }
        };

        if !report.is_alac() {
            debug!(path = %path.display(), "No ALAC stream, skipping");
            return FileOutcome::Skipped {
                reason: SkipReason::NotAlac,
            };
        }

        let rating = match self.converter.read_rating(path).await {
            Ok(rating) => rating,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read rating, converting without it");
                None
            }
        };

        let job = ConversionJob::for_source(path, rating);

        if self.dry_run {
            println!("f: {}", path.display());
            return FileOutcome::Listed { job };
        }

        let failure = match self.converter.convert(&job).await {
            Ok(outcome) if outcome.is_success() => {
                info!(
                    path = %path.display(),
                    rating = %RatingLabel(job.rating),
                    "converted"
                );
                let source_removed = remove_source(&job.input_path).await;
                return FileOutcome::Converted {
                    job,
                    source_removed,
                };
            }
            Ok(outcome) => {
                if let Some(stderr) = &outcome.stderr_tail {
                    debug!(path = %path.display(), %stderr, "ffmpeg stderr");
                }
                outcome.failure_reason()
            }
            Err(e) => e.to_string(),
        };

        error!(
            path = %path.display(),
            rating = %RatingLabel(job.rating),
            reason = %failure,
            "failed"
        );
        let output_removed = remove_failed_output(&job.output_path).await;
        FileOutcome::Failed {
            job,
            reason: failure,
            output_removed,
        }
    }
}

/// Deletes the original after a successful conversion.
async fn remove_source(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Could not delete old file");
            false
        }
    }
}

/// Deletes whatever a failed conversion left behind. A missing file just
/// means ffmpeg never got to write one.
async fn remove_failed_output(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Could not delete the failed file");
            false
        }
    }
}
