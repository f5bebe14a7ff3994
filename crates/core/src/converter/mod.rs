//! Converter module for inspecting and transcoding `.m4a` files.
//!
//! This module provides the `Converter` trait and an implementation that
//! drives the external `ffprobe` and `ffmpeg` binaries.
//!
//! # Features
//!
//! - ALAC detection from ffprobe's JSON stream listing
//! - Winamp rating extraction straight from the M4A item list
//! - ALAC to FLAC transcoding with cover art copied through
//! - Completion check on ffmpeg's `-progress` output
//!
//! # Example
//!
//! ```ignore
//! use alac2flac_core::converter::{ConversionJob, Converter, FfmpegConverter};
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let path = Path::new("/music/song.m4a");
//! if converter.probe(path).await?.is_alac() {
//!     let rating = converter.read_rating(path).await?;
//!     let job = ConversionJob::for_source(path, rating);
//!     let outcome = converter.convert(&job).await?;
//!     println!("success: {}", outcome.is_success());
//! }
//! ```

mod config;
mod error;
mod ffmpeg;
mod rating;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::{ConverterError, RatingError};
pub use ffmpeg::FfmpegConverter;
pub use rating::read_winamp_rating;
pub use traits::Converter;
pub use types::{
    output_path_for, ConversionJob, ConversionOutcome, ProbeFormat, ProbeReport, ProbeStream,
    Rating, ALAC_CODEC,
};
