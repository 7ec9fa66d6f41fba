//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (item creation, request rate, latency)
//! - Install the Prometheus recorder and scrape endpoint
//!
//! # Metrics
//! - `todo_items_created_total` (counter): items created
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency by method, route
//!
//! # Design Decisions
//! - Emission goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Route label uses the matched path template, never the raw path, to keep
//!   label cardinality bounded

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::observability::TelemetryError;

pub const ITEMS_CREATED: &str = "todo_items_created_total";
pub const HTTP_REQUESTS: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), TelemetryError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Count one newly created item.
pub fn record_item_created() {
    metrics::counter!(ITEMS_CREATED).increment(1);
}

/// Record a completed request.
pub fn record_request(method: &str, route: &str, status: u16, start_time: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!(HTTP_REQUESTS, &labels).increment(1);

    let labels = [("method", method.to_string()), ("route", route.to_string())];
    metrics::histogram!(HTTP_REQUEST_DURATION, &labels)
        .record(start_time.elapsed().as_secs_f64());
}

/// Middleware recording request count and latency.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16(), start_time);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_created_counter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_item_created();
            record_item_created();
        });

        assert!(handle.render().contains("todo_items_created_total 2"));
    }

    #[test]
    fn test_request_metrics_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_request("GET", "/todos/{id}", 404, Instant::now());
        });

        let rendered = handle.render();
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("route=\"/todos/{id}\""));
        assert!(rendered.contains("status=\"404\""));
        assert!(rendered.contains("http_request_duration_seconds"));
    }

    #[test]
    fn test_metrics_without_recorder_are_noops() {
        record_item_created();
        record_request("POST", "/todos", 201, Instant::now());
    }
}
