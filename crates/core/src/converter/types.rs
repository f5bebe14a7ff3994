//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Codec name ffprobe reports for Apple Lossless streams.
pub const ALAC_CODEC: &str = "alac";

/// Parsed `ffprobe -show_streams -show_format` output.
///
/// Only the fields we look at are typed. Everything else in the JSON is
/// ignored, and every field ffprobe may omit is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Streams found in the container.
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    /// Container-level information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ProbeFormat>,
}

impl ProbeReport {
    /// Whether any stream in the file is ALAC-encoded.
    pub fn is_alac(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec_name.as_deref() == Some(ALAC_CODEC))
    }
}

/// A single stream entry from ffprobe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeStream {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub sample_rate: Option<String>,
    #[serde(default)]
    pub channels: Option<u8>,
    #[serde(default)]
    pub bits_per_raw_sample: Option<String>,
}

/// The format section from ffprobe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeFormat {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub format_name: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Winamp rating value as stored in the M4A `rate` item.
///
/// Winamp stores 0-100 in steps of 20 for one to five stars; other
/// writers use the full byte range. The value is carried through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(pub u64);

impl Rating {
    /// Zero means "not rated" and is not written to the output.
    pub fn is_rated(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single ALAC to FLAC conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Source `.m4a` file.
    pub input_path: PathBuf,
    /// Destination `.flac` file.
    pub output_path: PathBuf,
    /// Rating to write as the `RATING` tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

impl ConversionJob {
    /// Creates a job writing next to the source with a `.flac` extension.
    pub fn for_source(input_path: impl Into<PathBuf>, rating: Option<Rating>) -> Self {
        let input_path = input_path.into();
        let output_path = output_path_for(&input_path);
        Self {
            input_path,
            output_path,
            rating,
        }
    }

    /// Rating to embed, if any. Unrated (0) files get no tag.
    pub fn effective_rating(&self) -> Option<Rating> {
        self.rating.filter(Rating::is_rated)
    }
}

/// Output path for a source: same directory and base name, `.flac` extension.
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension("flac")
}

/// What ffmpeg reported for a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Process exit code. `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Whether the completion marker showed up in the progress output.
    pub marker_found: bool,
    /// Last lines ffmpeg printed to stderr, for failure reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_tail: Option<String>,
}

impl ConversionOutcome {
    /// A zero exit code alone is not enough: ffmpeg must also have
    /// reported the end of its progress stream.
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0) && self.marker_found
    }

    /// Short human-readable reason for a failed outcome.
    pub fn failure_reason(&self) -> String {
        match (self.exit_code, self.marker_found) {
            (Some(0), false) => "ffmpeg exited cleanly without reporting completion".to_string(),
            (Some(code), _) => format!("ffmpeg exited with code {}", code),
            (None, _) => "ffmpeg was terminated by a signal".to_string(),
        }
    }
}
