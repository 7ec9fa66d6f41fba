//! Request context enrichment middleware.
//!
//! Attaches correlation fields (Lambda request id, tenant/group id) to every
//! log event emitted while a request is processed.
//!
//! Fields live on a per-request `request_context` span that instruments the
//! downstream future. The span closes when that future completes, on success
//! or error, so nothing outlives the request and concurrent requests never see
//! each other's fields. The same values are also inserted into the request
//! extensions as a [`RequestContext`] for handlers that want them explicitly.

use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use tracing::{field, Instrument, Span};

use crate::config::EnrichmentConfig;
use crate::host::Invocation;

pub const DEFAULT_GROUP_HEADER: &str = "x-group-id";

/// Log field holding the invocation id.
pub const INVOCATION_FIELD: &str = "aws_request_id";
/// Log field holding the tenant/group id.
pub const GROUP_FIELD: &str = "group_id";

/// Settings for [`enrich_request_context`].
#[derive(Debug, Clone)]
pub struct ContextSettings {
    group_header: HeaderName,
}

impl ContextSettings {
    pub fn new(group_header: HeaderName) -> Self {
        Self { group_header }
    }

    /// Falls back to [`DEFAULT_GROUP_HEADER`] if the configured name is invalid.
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        let group_header = HeaderName::try_from(config.group_header.as_str()).unwrap_or_else(|_| {
            tracing::warn!(
                header = %config.group_header,
                fallback = DEFAULT_GROUP_HEADER,
                "Invalid group header name, using fallback"
            );
            HeaderName::from_static(DEFAULT_GROUP_HEADER)
        });
        Self { group_header }
    }

    pub fn group_header(&self) -> &HeaderName {
        &self.group_header
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_GROUP_HEADER))
    }
}

/// Correlation fields for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub invocation_id: Option<String>,
    pub group_id: Option<String>,
}

impl RequestContext {
    /// Extract whatever correlation fields the request carries.
    pub fn from_request<B>(request: &axum::http::Request<B>, settings: &ContextSettings) -> Self {
        let invocation_id = request
            .extensions()
            .get::<Invocation>()
            .map(|invocation| invocation.request_id.clone())
            .filter(|id| !id.is_empty());

        let group_id = request
            .headers()
            .get(&settings.group_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from);

        Self {
            invocation_id,
            group_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.invocation_id.is_none() && self.group_id.is_none()
    }

    /// Span carrying the present fields; absent ones are left unrecorded.
    pub fn span(&self) -> Span {
        let span = tracing::info_span!(
            "request_context",
            aws_request_id = field::Empty,
            group_id = field::Empty,
        );
        if let Some(id) = &self.invocation_id {
            span.record(INVOCATION_FIELD, id.as_str());
        }
        if let Some(group) = &self.group_id {
            span.record(GROUP_FIELD, group.as_str());
        }
        span
    }
}

/// Scope the rest of request processing under the request's correlation
/// fields. Requests without any field pass straight through.
pub async fn enrich_request_context(
    State(settings): State<ContextSettings>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::from_request(&request, &settings);
    if context.is_empty() {
        return next.run(request).await;
    }

    let span = context.span();
    request.extensions_mut().insert(context);
    next.run(request).instrument(span).await
}
