use serde::{Deserialize, Serialize};

use crate::converter::ConverterConfig;
use crate::scanner::DEFAULT_PATTERN;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// File discovery settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScanSettings {
    /// Glob pattern, relative to the scan root.
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
        }
    }
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}
