//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (spans with correlation IDs)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON in Lambda/CloudWatch)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Distributed tracing (OTLP collector, optional)
//! ```
//!
//! # Design Decisions
//! - Initialized exactly once, before the router is built
//! - Request context flows through span fields, not thread-locals
//! - The returned guard flushes pending spans on drop

pub mod logging;
pub mod metrics;
pub mod tracing;

use std::net::SocketAddr;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::AppConfig;
use crate::host::HostMode;

/// Failures while bringing up logging, tracing or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),

    #[error("failed to build OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),
}

/// Keeps the tracer provider alive; flushes and shuts it down on drop.
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("tracer provider shutdown failed: {}", e);
            }
        }
    }
}

/// Install the global subscriber, tracer provider, propagator and (optionally)
/// the metrics recorder.
///
/// `mode` must already be resolved; it picks the log format when the config
/// asks for `auto`.
pub fn init(config: &AppConfig, mode: HostMode) -> Result<TelemetryGuard, TelemetryError> {
    let format = logging::resolve_format(config.logging.format, &config.service.environment, mode);

    let tracer_provider = if config.tracing.enabled {
        let provider = self::tracing::build_tracer_provider(&config.service, &config.tracing)?;
        global::set_text_map_propagator(TraceContextPropagator::new());
        global::set_tracer_provider(provider.clone());
        Some(provider)
    } else {
        None
    };

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service.name.clone()))
    });

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(logging::env_filter(&config.logging.level))
        .with(logging::fmt_layer(format, &config.service))
        .try_init()?;

    if config.metrics.enabled {
        let addr: SocketAddr = config
            .metrics
            .bind_address
            .parse()
            .map_err(|_| TelemetryError::MetricsAddress(config.metrics.bind_address.clone()))?;
        self::metrics::init_metrics(addr)?;
    }

    ::tracing::info!(
        service = %config.service.name,
        environment = %config.service.environment,
        log_format = ?format,
        tracing_enabled = config.tracing.enabled,
        metrics_enabled = config.metrics.enabled,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { tracer_provider })
}
