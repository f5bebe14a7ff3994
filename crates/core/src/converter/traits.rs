//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionOutcome, ProbeReport, Rating};

/// Something that can inspect `.m4a` files and turn them into FLAC.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Probes a media file for its streams and format.
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ConverterError>;

    /// Reads the Winamp rating embedded in the file, if there is one.
    async fn read_rating(&self, path: &Path) -> Result<Option<Rating>, ConverterError>;

    /// Runs a conversion and reports how it ended.
    ///
    /// `Ok` means the converter ran; check [`ConversionOutcome::is_success`]
    /// to know whether the output is usable.
    async fn convert(&self, job: &ConversionJob) -> Result<ConversionOutcome, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
