//! Todo REST service library.

pub mod config;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::AppConfig;
pub use host::{Host, HostMode, HttpHost, Invocation, LambdaHost};
pub use http::{router, AppState, InstanceInfo};
pub use lifecycle::Shutdown;
pub use store::{ItemStore, TodoItem};
