//! Types for the processor module.

use std::fmt;

use crate::converter::{ConversionJob, Rating};

/// Why a file was left alone.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The file has no ALAC stream.
    NotAlac,
    /// ffprobe could not inspect the file.
    ProbeFailed(String),
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Not eligible; nothing created or deleted.
    Skipped { reason: SkipReason },
    /// Eligible, but this is a dry run.
    Listed { job: ConversionJob },
    /// Converted. The source is deleted unless `source_removed` says otherwise.
    Converted {
        job: ConversionJob,
        source_removed: bool,
    },
    /// Conversion failed; any partial output was cleaned up.
    Failed {
        job: ConversionJob,
        reason: String,
        output_removed: bool,
    },
}

impl FileOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every candidate was handled.
    Completed,
    /// An interrupt was requested; the run stopped after the current file.
    Interrupted,
}

/// Per-kind file counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub skipped: usize,
    pub listed: usize,
    pub converted: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Listed { .. } => self.listed += 1,
            FileOutcome::Converted { .. } => self.converted += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Number of files handled, whatever the result.
    pub fn total(&self) -> usize {
        self.skipped + self.listed + self.converted + self.failed
    }
}

/// Result of a batch run. Never printed as a summary.
///
/// Only counts are kept, so memory stays flat however large the library
/// is. Use `BatchProcessor::run_with` to see each `FileOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub status: RunStatus,
    pub stats: BatchStats,
}

/// Formats an optional rating the way it is logged.
pub(crate) struct RatingLabel(pub Option<Rating>);

impl fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(rating) => write!(f, "{}", rating),
            None => f.write_str("none"),
        }
    }
}
