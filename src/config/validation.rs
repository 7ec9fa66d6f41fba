//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ratios within bounds)
//! - Check addresses and header names parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic constraint on `config`.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "listener.max_body_bytes",
            "must be greater than zero",
        ));
    }

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::new("service.name", "must not be empty"));
    }

    if !(0.0..=1.0).contains(&config.tracing.sample_ratio) {
        errors.push(ValidationError::new(
            "tracing.sample_ratio",
            format!("{} is outside 0.0..=1.0", config.tracing.sample_ratio),
        ));
    }
    if let Some(endpoint) = &config.tracing.otlp_endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ValidationError::new(
                "tracing.otlp_endpoint",
                format!("`{}` must be an http(s) URL", endpoint),
            ));
        }
    }

    if config.metrics.enabled && config.metrics.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "metrics.bind_address",
            format!("`{}` is not a socket address", config.metrics.bind_address),
        ));
    }

    if HeaderName::try_from(config.enrichment.group_header.as_str()).is_err() {
        errors.push(ValidationError::new(
            "enrichment.group_header",
            format!("`{}` is not a valid header name", config.enrichment.group_header),
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
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.listener.request_timeout_secs = 0;
        config.tracing.sample_ratio = 1.5;
        config.enrichment.group_header = "bad header".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "listener.request_timeout_secs",
                "tracing.sample_ratio",
                "enrichment.group_header",
            ]
        );
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = AppConfig::default();
        config.metrics.bind_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.metrics.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "metrics.bind_address");
    }

    #[test]
    fn test_otlp_endpoint_scheme() {
        let mut config = AppConfig::default();
        config.tracing.otlp_endpoint = Some("collector:4318".into());
        assert!(validate_config(&config).is_err());

        config.tracing.otlp_endpoint = Some("http://collector:4318/v1/traces".into());
        assert!(validate_config(&config).is_ok());
    }
}
