pub mod config;
pub mod converter;
pub mod processor;
pub mod scanner;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{Converter, ConverterConfig, ConverterError, FfmpegConverter, Rating};
pub use processor::{BatchProcessor, BatchReport, BatchStats, FileOutcome, RunStatus, ScanConfig};
pub use scanner::{CandidateFile, FileScanner, ScanError};
