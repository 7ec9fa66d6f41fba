//! Todo REST service.
//!
//! Serves a small todo API from an in-memory store, either as a standalone
//! HTTP server or inside AWS Lambda.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                   TODO API                     │
//!                      │                                                │
//!   HTTP client ───────┼─▶ HttpHost ──┐                                 │
//!                      │              ├─▶ Router ─▶ handlers ─▶ store   │
//!   API Gateway ───────┼─▶ LambdaHost ┘    │                            │
//!                      │                   ▼                            │
//!                      │   request id · trace span · metrics · context  │
//!                      │                                                │
//!                      │   ┌────────────────────────────────────────┐   │
//!                      │   │          Cross-Cutting Concerns         │   │
//!                      │   │  config · observability · lifecycle     │   │
//!                      │   └────────────────────────────────────────┘   │
//!                      └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use todo_api::host::HostMode;
use todo_api::lifecycle::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "todo-api")]
#[command(about = "Todo REST service (HTTP or AWS Lambda)", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host adapter; overrides the config file
    #[arg(short, long, value_enum)]
    mode: Option<HostMode>,

    /// Listener address for the HTTP host; overrides the config file
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = StartupOptions {
        config_path: cli.config,
        mode: cli.mode,
        bind_address: cli.bind,
    };

    match lifecycle::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "todo-api failed");
            eprintln!("todo-api: {}", e);
            ExitCode::FAILURE
        }
    }
}
