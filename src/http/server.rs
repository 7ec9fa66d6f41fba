//! Router assembly.
//!
//! # Responsibilities
//! - Register the todo, welcome and documentation routes
//! - Wire up middleware (request ID, tracing, limits, timeout, metrics,
//!   request context)
//!
//! # Design Decisions
//! - The router is host-agnostic; `host::HttpHost` and `host::LambdaHost`
//!   both serve the value returned by [`router`]
//! - The OpenAPI document is always served; the Swagger UI page only in the
//!   `development` environment
//! - Layer order, outermost first: request ID assignment → request ID
//!   propagation → trace → metrics → timeout → body limit → request context.
//!   The request span is opened before any context span so it can adopt a
//!   remote `traceparent` parent; handler logs nest under both

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::get,
    Router,
};
use serde_json::Value;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::host::HostMode;
use crate::http::docs::{self, OPENAPI_PATH, SWAGGER_UI_PATH};
use crate::http::handlers;
use crate::http::middleware::{enrich_request_context, ContextSettings};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics::track_metrics;
use crate::observability::tracing::RequestSpan;
use crate::store::ItemStore;

/// Identity of this running instance, shown on `/welcome`.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub id: Uuid,
    pub service: String,
    pub environment: String,
    pub host: HostMode,
}

impl InstanceInfo {
    pub fn new(config: &AppConfig, host: HostMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            service: config.service.name.clone(),
            environment: config.service.environment.clone(),
            host,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: ItemStore,
    pub instance: Arc<InstanceInfo>,
    pub openapi: Arc<Value>,
}

impl AppState {
    pub fn new(store: ItemStore, instance: InstanceInfo) -> Self {
        let openapi = docs::openapi_document(&instance);
        Self {
            store,
            instance: Arc::new(instance),
            openapi: Arc::new(openapi),
        }
    }
}

/// Build the application router with all middleware layers.
#[allow(deprecated)]
pub fn router(config: &AppConfig, state: AppState) -> Router {
    let context = ContextSettings::from_config(&config.enrichment);

    let mut routes = Router::new()
        .route("/todos", get(handlers::list).post(handlers::create))
        .route("/todos/{id}", get(handlers::get_one).delete(handlers::delete))
        .route("/welcome", get(handlers::welcome))
        .route(OPENAPI_PATH, get(docs::openapi_document_handler));
    if config.service.is_development() {
        routes = routes.route(SWAGGER_UI_PATH, get(docs::swagger_ui));
    }

    routes
        .with_state(state)
        .layer(middleware::from_fn_with_state(context, enrich_request_context))
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.listener.request_timeout_secs,
        )))
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan::new(&config.service)))
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}
