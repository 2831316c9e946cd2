//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{GearsConfig, LogOutput, LoggingConfig, ServicesConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &GearsConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_services_config(&config.services)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when output is 'file'",
        ));
    }

    for target in logging.filters.keys() {
        if target.is_empty() {
            return Err(ConfigError::invalid_filter(target, "target is empty"));
        }
        if target.contains(|c: char| c.is_whitespace() || c == '=' || c == ',') {
            return Err(ConfigError::invalid_filter(
                target,
                "target cannot contain whitespace, '=' or ','",
            ));
        }
    }

    Ok(())
}

fn validate_services_config(services: &ServicesConfig) -> ConfigResult<()> {
    // An empty prefix is allowed and disables the private-method convention.
    if services.private_prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(
            "services.private_prefix cannot contain whitespace",
        ));
    }
    Ok(())
}
