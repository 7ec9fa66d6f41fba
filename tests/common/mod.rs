//! Shared utilities for integration and load testing.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

use todo_api::config::{AppConfig, ServiceConfig};
use todo_api::host::{Host, HostMode, HttpHost};
use todo_api::http::{router, AppState, InstanceInfo};
use todo_api::lifecycle::Shutdown;
use todo_api::observability::logging;
use todo_api::store::ItemStore;

/// A running service bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: ItemStore,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the host and wait for it to drain.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Start the service with default configuration on `127.0.0.1:0`.
#[allow(dead_code)]
pub async fn start_server() -> TestServer {
    start_server_with(AppConfig::default()).await
}

/// Start the service with `config` on `127.0.0.1:0`.
#[allow(dead_code)]
pub async fn start_server_with(config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let shutdown = Shutdown::new();
    let host = HttpHost::new(listener, shutdown.subscribe());
    let addr = host.local_addr().unwrap();

    let store = ItemStore::new();
    let state = AppState::new(store.clone(), InstanceInfo::new(&config, HostMode::Http));
    let app = router(&config, state);

    let handle = tokio::spawn(async move {
        host.serve(app).await.unwrap();
    });

    TestServer {
        addr,
        store,
        shutdown,
        handle,
    }
}

/// In-memory log sink for asserting on emitted JSON lines.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl CapturedLogs {
    /// Every captured line parsed as JSON.
    pub fn lines(&self) -> Vec<serde_json::Value> {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    /// Lines whose message equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<serde_json::Value> {
        self.lines()
            .into_iter()
            .filter(|l| l["fields"]["message"] == message)
            .collect()
    }
}

pub struct CapturedWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buf: self.buf.clone(),
        }
    }
}

/// The production JSON layer writing into `logs`, at debug level.
#[allow(dead_code)]
pub fn json_subscriber(logs: CapturedLogs) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(LevelFilter::DEBUG)
        .with(logging::json_layer(&ServiceConfig::default(), logs))
}
