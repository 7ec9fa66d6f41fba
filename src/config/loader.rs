//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment overrides,
/// then validate.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
///
/// Override errors and validation errors are reported together.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    let (config, mut errors) = apply_env_overrides(config, lookup);
    if let Err(mut invalid) = validate_config(&config) {
        errors.append(&mut invalid);
    }
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` resolves a variable name; taking it as a parameter keeps this
/// testable without touching the process environment. Values that cannot be
/// parsed leave the field unchanged and are returned as errors.
pub fn apply_env_overrides<F>(
    mut config: AppConfig,
    lookup: F,
) -> (AppConfig, Vec<ValidationError>)
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(name) = lookup("TODO_API_SERVICE_NAME") {
        config.service.name = name;
    }
    if let Some(environment) = lookup("TODO_API_ENVIRONMENT") {
        config.service.environment = environment;
    }
    if let Some(addr) = lookup("TODO_API_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(format) = lookup("TODO_API_LOG_FORMAT") {
        match format.parse() {
            Ok(format) => config.logging.format = format,
            Err(e) => errors.push(ValidationError::new(
                "logging.format",
                format!("TODO_API_LOG_FORMAT: {}", e),
            )),
        }
    }
    if let Some(endpoint) = lookup("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT") {
        config.tracing.otlp_endpoint = Some(endpoint);
    }
    (config, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TODO_API_SERVICE_NAME", "todos-prod"),
            ("TODO_API_ENVIRONMENT", "production"),
            ("TODO_API_LOG_FORMAT", "pretty"),
            ("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT", "http://collector:4318/v1/traces"),
        ]
        .into_iter()
        .collect();

        let (config, errors) = apply_env_overrides(AppConfig::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });
        assert!(errors.is_empty());

        assert_eq!(config.service.name, "todos-prod");
        assert_eq!(config.service.environment, "production");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(
            config.tracing.otlp_endpoint.as_deref(),
            Some("http://collector:4318/v1/traces")
        );
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_log_format_is_reported() {
        let (config, errors) = apply_env_overrides(AppConfig::default(), |key| {
            (key == "TODO_API_LOG_FORMAT").then(|| "xml".to_string())
        });
        assert_eq!(config.logging.format, LogFormat::Auto);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "logging.format");
    }

    #[test]
    fn test_env_and_file_errors_reported_together() {
        let path = std::env::temp_dir().join(format!("todo-api-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[listener]\nrequest_timeout_secs = 0\n").unwrap();

        let err = load_config_with(Some(&path), |key| {
            (key == "TODO_API_LOG_FORMAT").then(|| "xml".to_string())
        })
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields.len(), 2);
                assert!(fields.contains(&"logging.format"));
                assert!(fields.contains(&"listener.request_timeout_secs"));
            }
            other => panic!("expected validation errors, got {:?}", other),
        }

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("todo-api-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "[listener]\nbind_address = \"127.0.0.1:3000\"\n[metrics]\nenabled = true\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert!(config.metrics.enabled);

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("todo-api-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[tracing]\nsample_ratio = 7.0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("tracing.sample_ratio"));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
