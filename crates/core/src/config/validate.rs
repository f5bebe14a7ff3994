use glob::Pattern;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Scan pattern is a non-empty, valid glob
/// - Completion marker is not empty
/// - Conversion timeout, when set, is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let pattern = config.scan.pattern.trim();
    if pattern.is_empty() {
        return Err(ConfigError::ValidationError(
            "scan.pattern cannot be empty".to_string(),
        ));
    }
    if let Err(e) = Pattern::new(pattern) {
        return Err(ConfigError::ValidationError(format!(
            "scan.pattern is not a valid glob: {}",
            e
        )));
    }

    if config.converter.completion_marker.is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.completion_marker cannot be empty".to_string(),
        ));
    }

    if config.converter.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
