//! HTTP surface of the todo service.
//!
//! # Data Flow
//! ```text
//! Host (HTTP listener or Lambda runtime)
//!     → request.rs (assign / echo x-request-id)
//!     → observability::tracing (request span)
//!     → observability::metrics (count, latency)
//!     → middleware/context.rs (aws_request_id, group_id)
//!     → handlers.rs (todo endpoints), docs.rs (OpenAPI, Swagger UI)
//!     → store (in-memory items)
//!     → response.rs (status mapping)
//! ```

pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{router, AppState, InstanceInfo};
