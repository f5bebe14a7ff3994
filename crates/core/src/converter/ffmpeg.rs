//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::rating::read_winamp_rating;
use super::traits::Converter;
use super::types::{ConversionJob, ConversionOutcome, ProbeReport, Rating};

/// Number of stderr lines kept for failure reports.
const STDERR_TAIL_LINES: usize = 10;

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Base command for spawning one of the media tools.
    fn command(&self, program: &Path) -> Command {
        let mut std_cmd = std::process::Command::new(program);

        // Keeps a terminal Ctrl+C from reaching the child; we finish the
        // current file and stop on our own.
        #[cfg(unix)]
        if self.config.isolate_process_group {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    /// Builds ffmpeg arguments for an ALAC to FLAC conversion.
    ///
    /// Paths are passed through as `OsString` so names that are not valid
    /// UTF-8 reach ffmpeg byte for byte.
    fn build_conversion_args(&self, job: &ConversionJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(), // Overwrite output
            "-nostdin".into(),
            // Progress key=value pairs on stdout, ending in `progress=end`
            "-progress".into(),
            "-".into(),
            "-loglevel".into(),
            self.config.ffmpeg_log_level.as_str().into(),
            "-i".into(),
            job.input_path.clone().into_os_string(),
            "-c:a".into(),
            "flac".into(),
            // Cover art comes through as a video stream
            "-c:v".into(),
            "copy".into(),
        ];

        if let Some(rating) = job.effective_rating() {
            args.push("-metadata".into());
            args.push(format!("RATING={}", rating).into());
        }

        args.extend(self.config.extra_ffmpeg_args.iter().map(OsString::from));

        args.push(job.output_path.clone().into_os_string());

        args
    }

    /// Parses ffprobe JSON output.
    fn parse_probe_output(output: &str) -> Result<ProbeReport, ConverterError> {
        serde_json::from_str(output).map_err(|e| ConverterError::ParseError {
            reason: format!("Failed to parse ffprobe output: {}", e),
        })
    }

    fn not_found_or_io(e: std::io::Error, missing: impl FnOnce() -> ConverterError) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            missing()
        } else {
            ConverterError::Io(e)
        }
    }

    fn ffmpeg_not_found(&self) -> ConverterError {
        ConverterError::FfmpegNotFound {
            path: self.config.ffmpeg_path.clone(),
        }
    }

    fn ffprobe_not_found(&self) -> ConverterError {
        ConverterError::FfprobeNotFound {
            path: self.config.ffprobe_path.clone(),
        }
    }
}

/// Keeps the last few non-empty lines of a tool's stderr.
fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    Some(lines[start..].join("\n"))
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<ProbeReport, ConverterError> {
        if !path.exists() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = self
            .command(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| Self::not_found_or_io(e, || self.ffprobe_not_found()))?;

        if !output.status.success() {
            return Err(ConverterError::probe_failed(format!(
                "ffprobe exited with code {:?}",
                output.status.code()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(&stdout)
    }

    async fn read_rating(&self, path: &Path) -> Result<Option<Rating>, ConverterError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<Option<Rating>, ConverterError> {
            let mut file = std::fs::File::open(&path)?;
            read_winamp_rating(&mut file).map_err(|source| ConverterError::Rating {
                path: path.clone(),
                source,
            })
        })
        .await
        .map_err(|e| ConverterError::Io(std::io::Error::other(e)))?
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConversionOutcome, ConverterError> {
        let args = self.build_conversion_args(job);
        debug!(ffmpeg = %self.config.ffmpeg_path.display(), ?args, "Starting conversion");

        let child = self
            .command(&self.config.ffmpeg_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::not_found_or_io(e, || self.ffmpeg_not_found()))?;

        let output = match self.config.timeout_secs {
            Some(secs) => match timeout(Duration::from_secs(secs), child.wait_with_output()).await {
                Ok(result) => result?,
                // Dropping the future drops the child, and kill_on_drop stops it.
                Err(_) => return Err(ConverterError::Timeout { timeout_secs: secs }),
            },
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(ConversionOutcome {
            exit_code: output.status.code(),
            marker_found: stdout.contains(&self.config.completion_marker),
            stderr_tail: stderr_tail(&output.stderr),
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        self.command(&self.config.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| Self::not_found_or_io(e, || self.ffmpeg_not_found()))?;

        self.command(&self.config.ffprobe_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| Self::not_found_or_io(e, || self.ffprobe_not_found()))?;

        Ok(())
    }
}
