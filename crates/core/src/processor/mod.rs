//! Processor module: the per-file workflow of a conversion run.
//!
//! For each candidate the processor probes for ALAC, reads the rating,
//! runs the conversion and then deletes either the source (on success)
//! or the partial output (on failure). Files are handled strictly one at
//! a time, and a cancellation request is honoured only between files.

mod config;
mod runner;
mod types;

pub use config::ScanConfig;
pub use runner::BatchProcessor;
pub use types::{BatchReport, BatchStats, FileOutcome, RunStatus, SkipReason};
