//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while inspecting or converting a file.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// FFprobe exited unsuccessfully.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// FFprobe output was not the JSON we asked for.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// The rating could not be read from the container.
    #[error("Failed to read rating from {path}: {source}")]
    Rating {
        path: PathBuf,
        #[source]
        source: RatingError,
    },

    /// I/O error during inspection or conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }
}

/// Errors from walking the MP4 box tree looking for the rating item.
#[derive(Debug, Error)]
pub enum RatingError {
    /// A box header claims more bytes than its parent holds.
    #[error("box '{kind}' at offset {offset} overruns its parent")]
    Truncated { kind: String, offset: u64 },

    /// A box header is smaller than the header itself.
    #[error("box '{kind}' at offset {offset} has invalid size {size}")]
    InvalidSize { kind: String, offset: u64, size: u64 },

    /// The rating data atom has a payload we do not understand.
    #[error("unsupported rating payload (type {data_type}, {len} bytes)")]
    UnsupportedPayload { data_type: u32, len: usize },

    /// I/O error while reading the container.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
