//! Command-line interface argument parsing and validation.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use alac2flac_core::{Config, ScanConfig};

/// Converts ALAC .m4a files to FLAC, keeping the Winamp rating.
#[derive(Parser, Debug)]
#[command(
    name = "alac2flac",
    version,
    about,
    long_about = "Scans a directory for .m4a files with an ALAC audio stream and converts them\n\
                  to FLAC with ffmpeg, copying cover art and the Winamp rating (as RATING).\n\
                  The original is deleted once ffmpeg reports a complete conversion.",
    disable_version_flag = true
)]
pub struct Args {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// Path to scan
    #[arg(short = 'f', long = "find", value_name = "PATH")]
    pub find: PathBuf,

    /// Only list the ALAC files that would be converted
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// TOML configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// ffmpeg binary to use
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe binary to use
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Glob pattern for files to consider, relative to the scan path
    #[arg(long, value_name = "GLOB")]
    pub pattern: Option<String>,
}

/// Problems with the arguments that clap cannot catch.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Scan path not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Scan path is not a directory: {path}")]
    RootNotADirectory { path: PathBuf },
}

impl UsageError {
    /// Map to a BSD sysexits.h code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            UsageError::RootNotFound { .. } | UsageError::RootNotADirectory { .. } => {
                ExitCode::from(66) // EX_NOINPUT
            }
        }
    }
}

impl Args {
    /// Checks the scan root and builds the scan configuration.
    pub fn scan_config(&self) -> Result<ScanConfig, UsageError> {
        if !self.find.exists() {
            return Err(UsageError::RootNotFound {
                path: self.find.clone(),
            });
        }
        if !self.find.is_dir() {
            return Err(UsageError::RootNotADirectory {
                path: self.find.clone(),
            });
        }
        Ok(ScanConfig::new(&self.find).with_dry_run(self.dry_run))
    }

    /// Command-line flags take precedence over file and environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ffmpeg) = &self.ffmpeg {
            config.converter.ffmpeg_path = ffmpeg.clone();
        }
        if let Some(ffprobe) = &self.ffprobe {
            config.converter.ffprobe_path = ffprobe.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.scan.pattern = pattern.clone();
        }
    }
}
