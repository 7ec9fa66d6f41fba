//! HTTP middleware.

pub mod context;

pub use context::{enrich_request_context, ContextSettings, RequestContext};
