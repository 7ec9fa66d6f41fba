//! Host adapters.
//!
//! # Data Flow
//! ```text
//! HTTP listener ──┐
//!                 ├─→ axum Router (one request-in/response-out interface)
//! Lambda runtime ─┘      → request context → todo handlers → item store
//! ```
//!
//! # Design Decisions
//! - The router never knows which host serves it
//! - `HostMode::resolve` is the only place the environment picks a host
//! - The Lambda adapter exposes the invocation as an `Invocation` request
//!   extension; nothing downstream touches Lambda types

pub mod http;
pub mod lambda;

use std::future::Future;

use axum::Router;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::http::HttpHost;
pub use self::lambda::LambdaHost;

/// Variable the Lambda runtime always sets.
pub const LAMBDA_FUNCTION_NAME_ENV: &str = "AWS_LAMBDA_FUNCTION_NAME";

/// Which adapter serves the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HostMode {
    /// Lambda when running inside a Lambda function, HTTP otherwise.
    #[default]
    Auto,
    Http,
    Lambda,
}

impl HostMode {
    /// Resolve `Auto` against the Lambda function name, if any.
    pub fn resolve(self, lambda_function_name: Option<&str>) -> HostMode {
        match self {
            HostMode::Auto => match lambda_function_name {
                Some(name) if !name.is_empty() => HostMode::Lambda,
                _ => HostMode::Http,
            },
            concrete => concrete,
        }
    }

    /// Resolve `Auto` against the process environment.
    pub fn resolve_from_env(self) -> HostMode {
        self.resolve(std::env::var(LAMBDA_FUNCTION_NAME_ENV).ok().as_deref())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostMode::Auto => "auto",
            HostMode::Http => "http",
            HostMode::Lambda => "lambda",
        }
    }
}

impl std::fmt::Display for HostMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The serverless invocation a request belongs to.
///
/// Inserted into request extensions by the Lambda adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Lambda request id.
    pub request_id: String,
    /// X-Ray trace header supplied by the runtime.
    pub xray_trace_id: Option<String>,
}

impl Invocation {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            xray_trace_id: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lambda runtime failed: {0}")]
    Lambda(lambda_http::Error),
}

/// Serves a router until the host stops.
pub trait Host {
    fn serve(self, app: Router) -> impl Future<Output = Result<(), HostError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolves_from_lambda_env() {
        assert_eq!(HostMode::Auto.resolve(Some("todo-fn")), HostMode::Lambda);
        assert_eq!(HostMode::Auto.resolve(Some("")), HostMode::Http);
        assert_eq!(HostMode::Auto.resolve(None), HostMode::Http);
    }

    #[test]
    fn test_explicit_mode_ignores_env() {
        assert_eq!(HostMode::Http.resolve(Some("todo-fn")), HostMode::Http);
        assert_eq!(HostMode::Lambda.resolve(None), HostMode::Lambda);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(HostMode::Lambda.to_string(), "lambda");
        let mode: HostMode = serde_json::from_str("\"http\"").unwrap();
        assert_eq!(mode, HostMode::Http);
    }
}
