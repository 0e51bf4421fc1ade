//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that selects the deployment environment.
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

const DEVELOPMENT: &str = "development";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Config file is empty")]
    Empty,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// The `ENVIRONMENT` variable is read once here; see [`apply_environment`].
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let environment = std::env::var(ENVIRONMENT_VAR).ok();
    parse_config(&content, environment.as_deref())
}

/// Load a configuration for hot reload.
///
/// Unlike [`load_config`], an empty file is an error: writers truncate before
/// they write, and an empty file would otherwise parse as the all-default,
/// fully permissive policy.
pub fn reload_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(ConfigError::Empty);
    }
    let environment = std::env::var(ENVIRONMENT_VAR).ok();
    parse_config(&content, environment.as_deref())
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str, environment: Option<&str>) -> Result<GateConfig, ConfigError> {
    let mut config: GateConfig = toml::from_str(content)?;
    apply_environment(&mut config, environment);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the deployment environment into the policy's development flag.
///
/// Exactly `development` forces development mode on. Any other value, or no
/// value, keeps whatever the file says.
pub fn apply_environment(config: &mut GateConfig, environment: Option<&str>) {
    if environment == Some(DEVELOPMENT) {
        config.policy.is_development = true;
    }
}
