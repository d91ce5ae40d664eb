use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Catalog file name and header key are set
/// - Transfer buffer and parallelism are non-zero
/// - Managed id prefix and event buffer are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.catalog.file_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.file_name cannot be empty".to_string(),
        ));
    }

    if config.catalog.header_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.header_key cannot be empty".to_string(),
        ));
    }

    if config.transfer.buffer_size == 0 {
        return Err(ConfigError::ValidationError(
            "transfer.buffer_size cannot be 0".to_string(),
        ));
    }

    if config.transfer.max_parallel_file_ops == 0 {
        return Err(ConfigError::ValidationError(
            "transfer.max_parallel_file_ops cannot be 0".to_string(),
        ));
    }

    let prefix = &config.import.managed_id_prefix;
    if prefix.is_empty() || prefix.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "import.managed_id_prefix is not a valid directory name: {:?}",
            prefix
        )));
    }

    if config.import.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "import.event_buffer cannot be 0".to_string(),
        ));
    }

    Ok(())
}
