//! Testing utilities and mock implementations.
//!
//! `MockConverter` stands in for ffprobe/ffmpeg so the whole batch
//! workflow can be exercised against a temporary directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use alac2flac_core::testing::{MockConversion, MockConverter};
//!
//! let converter = MockConverter::new();
//! converter.set_alac("/music/a.m4a").await;
//! converter.set_conversion("/music/b.m4a", MockConversion::FailWithPartialOutput).await;
//! ```

mod mock_converter;

pub use mock_converter::{MockConversion, MockConverter, MockProbe};
