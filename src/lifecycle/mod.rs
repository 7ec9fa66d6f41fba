//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Resolve host → Telemetry → Store → Router → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → HTTP host stops accepting → In-flight requests drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then telemetry, then the host
//! - Fail fast: any startup error is fatal
//! - The Lambda runtime owns its own lifecycle; signals only drive the HTTP host

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupError, StartupOptions};
