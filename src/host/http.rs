//! Standalone HTTP host.

use std::io;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::host::{Host, HostError};

/// Serves the router on a bound TCP listener until shutdown is signalled.
pub struct HttpHost {
    listener: TcpListener,
    shutdown: broadcast::Receiver<()>,
}

impl HttpHost {
    pub fn new(listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Self {
        Self { listener, shutdown }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Host for HttpHost {
    async fn serve(self, app: Router) -> Result<(), HostError> {
        let addr = self.listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP host starting");

        let mut shutdown = self.shutdown;
        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP host stopped");
        Ok(())
    }
}
