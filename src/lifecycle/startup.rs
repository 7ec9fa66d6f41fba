//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration, then apply command-line overrides
//! - Resolve the host mode once
//! - Initialize telemetry before anything logs
//! - Build the store, state and router
//! - Hand the router to the selected host
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The HTTP listener binds last (traffic only when ready)

use std::path::PathBuf;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::validation::validate_config;
use crate::config::{load_config, AppConfig, ConfigError};
use crate::host::{Host, HostError, HostMode, HttpHost, LambdaHost};
use crate::http::{router, AppState, InstanceInfo};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{self, TelemetryError};
use crate::store::ItemStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub mode: Option<HostMode>,
    pub bind_address: Option<String>,
}

/// Load configuration from `options` and apply its overrides.
pub fn prepare_config(options: &StartupOptions) -> Result<AppConfig, ConfigError> {
    let mut config = load_config(options.config_path.as_deref())?;

    if let Some(mode) = options.mode {
        config.host.mode = mode;
    }
    if let Some(address) = &options.bind_address {
        config.listener.bind_address = address.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    Ok(config)
}

/// Build the shared state and the router for a resolved host mode.
pub fn build_app(config: &AppConfig, mode: HostMode) -> Router {
    let state = AppState::new(ItemStore::new(), InstanceInfo::new(config, mode));
    router(config, state)
}

/// Run the service until the host stops.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = prepare_config(&options)?;
    let mode = config.host.mode.resolve_from_env();

    let _telemetry = observability::init(&config, mode)?;

    tracing::info!(
        service = %config.service.name,
        host = %mode,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.listener.request_timeout_secs,
        "Configuration loaded"
    );

    let app = build_app(&config, mode);

    match mode {
        HostMode::Lambda => LambdaHost.serve(app).await?,
        HostMode::Http | HostMode::Auto => {
            let listener = TcpListener::bind(&config.listener.bind_address)
                .await
                .map_err(|source| StartupError::Bind {
                    address: config.listener.bind_address.clone(),
                    source,
                })?;

            let shutdown = Shutdown::new();
            let host = HttpHost::new(listener, shutdown.subscribe());
            signals::spawn_signal_listener(shutdown);
            host.serve(app).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_apply() {
        let options = StartupOptions {
            config_path: None,
            mode: Some(HostMode::Http),
            bind_address: Some("127.0.0.1:3000".into()),
        };
        let config = prepare_config(&options).unwrap();
        assert_eq!(config.host.mode, HostMode::Http);
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_invalid_bind_override_rejected() {
        let options = StartupOptions {
            bind_address: Some("not-an-address".into()),
            ..Default::default()
        };
        assert!(matches!(
            prepare_config(&options),
            Err(ConfigError::Validation(_))
        ));
    }
}
