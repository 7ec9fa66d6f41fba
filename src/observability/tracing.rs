//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OpenTelemetry tracer provider (sampler, resource, OTLP export)
//! - Extract remote trace context from incoming requests
//! - Create the per-request HTTP span
//!
//! # Design Decisions
//! - Handlers only use `tracing` spans; `tracing-opentelemetry` bridges them
//! - W3C Trace Context is the only header format read; X-Ray ids from the
//!   Lambda runtime are converted to `traceparent` first
//! - A remote parent is only applied when no local span is active, so requests
//!   served inside a Lambda invocation nest under the invocation span

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::MatchedPath;
use axum::http::{HeaderMap, Request};
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{global, Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tower_http::trace::MakeSpan;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::{ServiceConfig, TracingConfig};
use crate::http::request::request_id;
use crate::observability::TelemetryError;

/// Build a tracer provider from configuration.
///
/// Spans are only exported when an OTLP endpoint is configured; otherwise the
/// provider still assigns trace ids so logs and responses can reference them.
pub fn build_tracer_provider(
    service: &ServiceConfig,
    config: &TracingConfig,
) -> Result<SdkTracerProvider, TelemetryError> {
    let resource = Resource::builder()
        .with_service_name(service.name.clone())
        .with_attribute(KeyValue::new(
            "deployment.environment",
            service.environment.clone(),
        ))
        .build();

    let sampler = Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
        config.sample_ratio,
    )));

    let mut builder = SdkTracerProvider::builder()
        .with_sampler(sampler)
        .with_resource(resource);

    if let Some(endpoint) = &config.otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint.clone())
            .build()?;
        builder = builder.with_batch_exporter(exporter);
        tracing::debug!(endpoint = %endpoint, "OTLP span export enabled");
    }

    Ok(builder.build())
}

struct HeaderMapExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Trace context carried by request headers, if any is valid.
pub fn remote_parent(headers: &HeaderMap) -> Option<Context> {
    let cx = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderMapExtractor(headers))
    });
    let valid = cx.span().span_context().is_valid();
    valid.then_some(cx)
}

/// Trace context described by an X-Ray trace header
/// (`Root=1-...;Parent=...;Sampled=1`).
pub fn xray_parent(xray: &str) -> Option<Context> {
    let traceparent = xray_to_traceparent(xray)?;
    let carrier = HashMap::from([("traceparent".to_string(), traceparent)]);
    let cx = global::get_text_map_propagator(|propagator| propagator.extract(&carrier));
    let valid = cx.span().span_context().is_valid();
    valid.then_some(cx)
}

/// Convert an X-Ray trace header into a W3C `traceparent` value.
pub fn xray_to_traceparent(xray: &str) -> Option<String> {
    let mut trace_id = None;
    let mut parent_id = None;
    let mut sampled = false;

    for part in xray.split(';').map(str::trim) {
        if let Some(root) = part.strip_prefix("Root=") {
            trace_id = parse_xray_root(root);
        } else if let Some(parent) = part.strip_prefix("Parent=") {
            parent_id = Some(parent);
        } else if part == "Sampled=1" {
            sampled = true;
        }
    }

    let trace_id = trace_id?;
    let parent_id = parent_id.filter(|p| p.len() == 16)?;
    let flags = if sampled { "01" } else { "00" };

    Some(format!("00-{}-{}-{}", trace_id, parent_id, flags))
}

fn parse_xray_root(root: &str) -> Option<String> {
    let mut parts = root.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("1"), Some(epoch), Some(unique), None) if epoch.len() + unique.len() == 32 => {
            Some(format!("{}{}", epoch, unique))
        }
        _ => None,
    }
}

/// Parent `span` on a remote trace context.
///
/// Returns false when the parent could not be attached (no OpenTelemetry
/// layer, span filtered out, or span already started); the reason is logged
/// at debug level and the span keeps its local parent.
pub fn set_remote_parent(span: &Span, parent: Context) -> bool {
    match span.set_parent(parent) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to attach remote trace parent");
            false
        }
    }
}

/// Trace id of the current span, when OpenTelemetry is recording one.
pub fn current_trace_id() -> Option<String> {
    let cx = Span::current().context();
    let span = cx.span();
    let span_context = span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}

/// `MakeSpan` for the HTTP trace layer.
///
/// Records the service identity on every request span so each log line carries
/// it, and adopts a remote parent from `traceparent` when there is no local
/// parent span.
#[derive(Clone)]
pub struct RequestSpan {
    service: Arc<str>,
    environment: Arc<str>,
}

impl RequestSpan {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            service: Arc::from(config.name.as_str()),
            environment: Arc::from(config.environment.as_str()),
        }
    }
}

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method();
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or_else(|| request.uri().path());

        let span = tracing::info_span!(
            "http.request",
            otel.name = %format!("{} {}", method, route),
            otel.kind = "server",
            http.request.method = %method,
            http.route = %route,
            url.path = %request.uri().path(),
            request_id = %request_id(request.headers()).unwrap_or("unknown"),
            service = %self.service,
            environment = %self.environment,
        );

        if Span::current().is_none() {
            if let Some(parent) = remote_parent(request.headers()) {
                set_remote_parent(&span, parent);
            }
        }

        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::propagation::TraceContextPropagator;

    #[test]
    fn test_xray_to_traceparent() {
        let header = "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1";
        assert_eq!(
            xray_to_traceparent(header).as_deref(),
            Some("00-5759e988bd862e3fe1be46a994272793-53995c3f42cd8ad8-01")
        );
    }

    #[test]
    fn test_xray_unsampled_and_malformed() {
        assert_eq!(
            xray_to_traceparent("Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8")
                .as_deref(),
            Some("00-5759e988bd862e3fe1be46a994272793-53995c3f42cd8ad8-00")
        );
        assert!(xray_to_traceparent("Root=1-5759e988-bd862e3fe1be46a994272793").is_none());
        assert!(xray_to_traceparent("Root=2-5759e988-bd862e3f;Parent=53995c3f42cd8ad8").is_none());
        assert!(xray_to_traceparent("").is_none());
    }

    #[test]
    fn test_remote_parent_from_traceparent() {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let mut headers = HeaderMap::new();
        headers.insert(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
                .parse()
                .unwrap(),
        );

        let cx = remote_parent(&headers).expect("valid parent");
        assert_eq!(
            cx.span().span_context().trace_id().to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );

        assert!(remote_parent(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_xray_parent() {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let cx = xray_parent(
            "Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1",
        )
        .expect("valid parent");
        assert_eq!(
            cx.span().span_context().trace_id().to_string(),
            "5759e988bd862e3fe1be46a994272793"
        );
    }

    fn sampled_parent() -> Context {
        global::set_text_map_propagator(TraceContextPropagator::new());
        xray_parent("Root=1-5759e988-bd862e3fe1be46a994272793;Parent=53995c3f42cd8ad8;Sampled=1")
            .expect("valid parent")
    }

    #[test]
    fn test_set_remote_parent_with_otel_layer() {
        use tracing_subscriber::layer::SubscriberExt;

        let subscriber = tracing_subscriber::registry().with(tracing_opentelemetry::layer());
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("http.request");
            assert!(set_remote_parent(&span, sampled_parent()));
        });
    }

    #[test]
    fn test_set_remote_parent_reports_failure() {
        assert!(!set_remote_parent(&Span::none(), sampled_parent()));

        let subscriber = tracing_subscriber::registry();
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("http.request");
            assert!(!set_remote_parent(&span, sampled_parent()));
        });
    }

    #[test]
    fn test_no_trace_id_without_subscriber() {
        assert!(current_trace_id().is_none());
    }
}
