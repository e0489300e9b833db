//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the live-reload paths are usable routes
//! - Validate value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ServerConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::ServerConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("{field} must start with '/', got {value:?}")]
    RelativePath { field: &'static str, value: String },

    #[error("live_reload.endpoint and live_reload.client_path must differ")]
    ConflictingReloadPaths,

    #[error("subfolder must not be empty when set")]
    EmptySubfolder,

    #[error("max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("unknown log level {0:?}")]
    UnknownLogLevel(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    let reload = &config.live_reload;
    for (field, value) in [
        ("live_reload.endpoint", &reload.endpoint),
        ("live_reload.client_path", &reload.client_path),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }
    if reload.endpoint == reload.client_path {
        errors.push(ValidationError::ConflictingReloadPaths);
    }

    if matches!(&config.subfolder, Some(s) if s.is_empty()) {
        errors.push(ValidationError::EmptySubfolder);
    }

    if config.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ServerConfig::default();
        config.host = " ".into();
        config.live_reload.endpoint = "reload".into();
        config.subfolder = Some(String::new());
        config.max_body_bytes = 0;
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyHost,
                ValidationError::RelativePath {
                    field: "live_reload.endpoint",
                    value: "reload".into()
                },
                ValidationError::EmptySubfolder,
                ValidationError::ZeroBodyLimit,
                ValidationError::UnknownLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn test_reload_paths_must_differ() {
        let mut config = ServerConfig::default();
        config.live_reload.client_path = config.live_reload.endpoint.clone();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ConflictingReloadPaths]);
    }
}
