//! Error responses.
//!
//! # Responsibilities
//! - Map handler failures to HTTP status codes
//!
//! # Design Decisions
//! - `NotFound` is a 404 with an empty body
//! - Malformed bodies and path ids are rejected by axum's extractors before
//!   a handler runs, so they never reach this type

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("todo item {0} not found")]
    NotFound(Uuid),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(id),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_empty_404() {
        let response = ApiError::from(StoreError::NotFound(Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("content-type").is_none());
    }
}
