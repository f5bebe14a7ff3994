//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::converter::{
    ConversionJob, ConversionOutcome, Converter, ConverterError, ProbeReport, ProbeStream, Rating,
    RatingError,
};

/// How the mock answers a probe for a path.
#[derive(Debug, Clone, PartialEq)]
pub enum MockProbe {
    /// One audio stream with this codec name.
    Codec(String),
    /// ffprobe failure.
    Fail,
}

/// How the mock behaves when asked to convert a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockConversion {
    /// Writes the output and reports completion.
    #[default]
    Succeed,
    /// Writes a partial output, then exits non-zero.
    FailWithPartialOutput,
    /// Exits non-zero without writing anything.
    FailWithoutOutput,
    /// Writes the output and exits 0 but never reports completion.
    MissingMarker,
    /// ffmpeg cannot be started at all.
    SpawnError,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Per-path probe results, ratings and conversion behavior
/// - Real output files, so filesystem effects can be asserted
/// - Recorded jobs for assertions
/// - An optional cancellation fired while a given file converts
///
/// Successful outputs contain a `fLaC` line followed by one line per tag,
/// e.g. `RATING=80`, so tests can check what would have been written.
///
/// # Example
///
/// ```rust,ignore
/// use alac2flac_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.set_alac("/music/a.m4a").await;
/// converter.set_rating("/music/a.m4a", Rating(80)).await;
///
/// let processor = BatchProcessor::new(converter.clone(), &config);
/// processor.run(files, &token).await;
///
/// assert_eq!(converter.conversion_count().await, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockConverter {
    /// Pre-configured probe results by path. Unknown paths probe as AAC.
    probes: Arc<RwLock<HashMap<PathBuf, MockProbe>>>,
    /// Ratings by path.
    ratings: Arc<RwLock<HashMap<PathBuf, Rating>>>,
    /// Paths whose rating cannot be read.
    rating_failures: Arc<RwLock<Vec<PathBuf>>>,
    /// Conversion behavior by input path.
    conversions_behavior: Arc<RwLock<HashMap<PathBuf, MockConversion>>>,
    /// Recorded conversion jobs.
    conversions: Arc<RwLock<Vec<ConversionJob>>>,
    /// Recorded probe calls.
    probed: Arc<RwLock<Vec<PathBuf>>>,
    /// Token to cancel when converting a given path.
    cancel_on_convert: Arc<RwLock<Option<(PathBuf, CancellationToken)>>>,
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a path probe as ALAC.
    pub async fn set_alac(&self, path: impl AsRef<Path>) {
        self.set_codec(path, "alac").await;
    }

    /// Make a path probe with a single audio stream of the given codec.
    pub async fn set_codec(&self, path: impl AsRef<Path>, codec: &str) {
        self.probes
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), MockProbe::Codec(codec.to_string()));
    }

    /// Make probing a path fail.
    pub async fn set_probe_failure(&self, path: impl AsRef<Path>) {
        self.probes
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), MockProbe::Fail);
    }

    /// Set the rating stored in a file.
    pub async fn set_rating(&self, path: impl AsRef<Path>, rating: Rating) {
        self.ratings
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), rating);
    }

    /// Make reading the rating of a path fail.
    pub async fn set_rating_failure(&self, path: impl AsRef<Path>) {
        self.rating_failures
            .write()
            .await
            .push(path.as_ref().to_path_buf());
    }

    /// Set how converting a path behaves.
    pub async fn set_conversion(&self, path: impl AsRef<Path>, behavior: MockConversion) {
        self.conversions_behavior
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), behavior);
    }

    /// Cancel `token` while `path` is being converted, as a Ctrl+C would.
    pub async fn cancel_during(&self, path: impl AsRef<Path>, token: CancellationToken) {
        *self.cancel_on_convert.write().await = Some((path.as_ref().to_path_buf(), token));
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<ConversionJob> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Get every path that was probed, in order.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }

    fn output_contents(job: &ConversionJob) -> String {
        let mut contents = String::from("fLaC\n");
        if let Some(rating) = job.effective_rating() {
            contents.push_str(&format!("RATING={}\n", rating));
        }
        contents
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<ProbeReport, ConverterError> {
        self.probed.write().await.push(path.to_path_buf());

        let codec = match self.probes.read().await.get(path) {
            Some(MockProbe::Fail) => {
                return Err(ConverterError::probe_failed("ffprobe exited with code Some(1)"))
            }
            Some(MockProbe::Codec(codec)) => codec.clone(),
            None => "aac".to_string(),
        };

        Ok(ProbeReport {
            streams: vec![ProbeStream {
                index: Some(0),
                codec_name: Some(codec),
                codec_type: Some("audio".to_string()),
                ..Default::default()
            }],
            format: None,
        })
    }

    async fn read_rating(&self, path: &Path) -> Result<Option<Rating>, ConverterError> {
        if self.rating_failures.read().await.iter().any(|p| p == path) {
            return Err(ConverterError::Rating {
                path: path.to_path_buf(),
                source: RatingError::UnsupportedPayload {
                    data_type: 13,
                    len: 3,
                },
            });
        }
        Ok(self.ratings.read().await.get(path).copied())
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConversionOutcome, ConverterError> {
        self.conversions.write().await.push(job.clone());

        if let Some((path, token)) = self.cancel_on_convert.read().await.as_ref() {
            if path == &job.input_path {
                token.cancel();
            }
        }

        let behavior = self
            .conversions_behavior
            .read()
            .await
            .get(&job.input_path)
            .copied()
            .unwrap_or_default();

        let (exit_code, marker_found) = match behavior {
            MockConversion::Succeed => {
                tokio::fs::write(&job.output_path, Self::output_contents(job)).await?;
                (0, true)
            }
            MockConversion::FailWithPartialOutput => {
                tokio::fs::write(&job.output_path, b"fLaC").await?;
                (1, false)
            }
            MockConversion::FailWithoutOutput => (1, false),
            MockConversion::MissingMarker => {
                tokio::fs::write(&job.output_path, Self::output_contents(job)).await?;
                (0, false)
            }
            MockConversion::SpawnError => {
                return Err(ConverterError::FfmpegNotFound {
                    path: PathBuf::from("ffmpeg"),
                })
            }
        };

        Ok(ConversionOutcome {
            exit_code: Some(exit_code),
            marker_found,
            stderr_tail: None,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_probe_defaults_to_aac() {
        let converter = MockConverter::new();
        let report = converter.probe(Path::new("/music/x.m4a")).await.unwrap();
        assert!(!report.is_alac());
        assert_eq!(converter.probed_paths().await, vec![PathBuf::from("/music/x.m4a")]);
    }

    #[tokio::test]
    async fn test_configured_probe_results() {
        let converter = MockConverter::new();
        converter.set_alac("/music/a.m4a").await;
        converter.set_probe_failure("/music/b.m4a").await;

        assert!(converter.probe(Path::new("/music/a.m4a")).await.unwrap().is_alac());
        assert!(converter.probe(Path::new("/music/b.m4a")).await.is_err());
    }

    #[tokio::test]
    async fn test_successful_conversion_writes_tags() {
        let dir = TempDir::new().unwrap();
        let converter = MockConverter::new();
        let job = ConversionJob::for_source(dir.path().join("a.m4a"), Some(Rating(80)));

        let outcome = converter.convert(&job).await.unwrap();
        assert!(outcome.is_success());

        let written = std::fs::read_to_string(&job.output_path).unwrap();
        assert!(written.contains("RATING=80"));
        assert_eq!(converter.conversion_count().await, 1);
    }

    #[tokio::test]
    async fn test_failure_modes() {
        let dir = TempDir::new().unwrap();
        let converter = MockConverter::new();
        let job = ConversionJob::for_source(dir.path().join("a.m4a"), None);

        converter
            .set_conversion(&job.input_path, MockConversion::FailWithPartialOutput)
            .await;
        let outcome = converter.convert(&job).await.unwrap();
        assert!(!outcome.is_success());
        assert!(job.output_path.exists());

        converter
            .set_conversion(&job.input_path, MockConversion::MissingMarker)
            .await;
        assert!(!converter.convert(&job).await.unwrap().is_success());

        converter
            .set_conversion(&job.input_path, MockConversion::SpawnError)
            .await;
        assert!(converter.convert(&job).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_during_conversion() {
        let dir = TempDir::new().unwrap();
        let converter = MockConverter::new();
        let token = CancellationToken::new();
        let job = ConversionJob::for_source(dir.path().join("a.m4a"), None);
        converter.cancel_during(&job.input_path, token.clone()).await;

        converter.convert(&job).await.unwrap();
        assert!(token.is_cancelled());
    }
}
