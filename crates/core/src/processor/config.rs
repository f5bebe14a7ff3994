//! Configuration for the processor module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to scan and whether to touch anything.
///
/// Built once at startup from the command line and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory to scan for `.m4a` files.
    pub root: PathBuf,

    /// List eligible files without converting or deleting anything.
    #[serde(default)]
    pub dry_run: bool,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    /// Sets dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_builder() {
        let config = ScanConfig::new("/music").with_dry_run(true);
        assert_eq!(config.root, PathBuf::from("/music"));
        assert!(config.dry_run);
        assert!(!ScanConfig::new("/music").dry_run);
    }
}
