//! Discovery of candidate `.m4a` files under a root directory.
//!
//! The scan is lazy: directories are read as the iterator is advanced,
//! so a large library starts converting right away. The iterator is
//! consumed once and cannot be restarted.

use glob::{MatchOptions, Paths, Pattern};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default pattern for files to consider.
pub const DEFAULT_PATTERN: &str = "**/*.m4a";

/// Errors from setting up a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid scan pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A file yielded by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Path relative to the scan root.
    pub relative: PathBuf,
    /// Path to open, i.e. the root joined with `relative`.
    pub path: PathBuf,
}

/// Enumerates files matching a glob pattern below a root directory.
#[derive(Debug, Clone)]
pub struct FileScanner {
    root: PathBuf,
    pattern: String,
}

impl FileScanner {
    pub fn new(root: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            pattern: pattern.into(),
        }
    }

    /// Scanner for `**/*.m4a` below `root`.
    pub fn with_default_pattern(root: impl Into<PathBuf>) -> Self {
        Self::new(root, DEFAULT_PATTERN)
    }

    /// Matching is case-sensitive, and wildcards never match a leading dot.
    fn match_options() -> MatchOptions {
        MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        }
    }

    /// Starts the scan.
    pub fn scan(&self) -> Result<ScanIter, ScanError> {
        let invalid = |reason: String| ScanError::InvalidPattern {
            pattern: self.pattern.clone(),
            reason,
        };

        // Validate the user pattern on its own so errors point at it, not
        // at the escaped root.
        Pattern::new(&self.pattern).map_err(|e| invalid(e.to_string()))?;

        let escaped_root = Pattern::escape(&self.root.to_string_lossy());
        let full = Path::new(&escaped_root).join(&self.pattern);
        let paths = glob::glob_with(&full.to_string_lossy(), Self::match_options())
            .map_err(|e| invalid(e.to_string()))?;

        Ok(ScanIter {
            root: self.root.clone(),
            paths,
        })
    }
}

/// Lazy iterator over matching regular files.
pub struct ScanIter {
    root: PathBuf,
    paths: Paths,
}

impl Iterator for ScanIter {
    type Item = CandidateFile;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.paths.next()? {
                Ok(path) => {
                    if !path.is_file() {
                        continue;
                    }
                    let relative = path
                        .strip_prefix(&self.root)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| path.clone());
                    return Some(CandidateFile { relative, path });
                }
                Err(e) => {
                    warn!(
                        path = %e.path().display(),
                        error = %e.error(),
                        "Skipping unreadable entry"
                    );
                }
            }
        }
    }
}
