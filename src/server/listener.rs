//! HTTP server listener
//!
//! Binds the listening socket and serves the router until shutdown.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::registry::StreamRegistry;
use crate::server::config::ServerConfig;
use crate::server::routes;

/// HTTP front end over a [`StreamRegistry`]
pub struct ApiServer {
    config: ServerConfig,
    registry: Arc<StreamRegistry>,
}

impl ApiServer {
    /// Create a new server serving `registry`
    pub fn new(config: ServerConfig, registry: Arc<StreamRegistry>) -> Self {
        Self { config, registry }
    }

    /// Get a reference to the stream registry
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Build the router for this server
    pub fn router(&self) -> Router {
        routes::router(Arc::clone(&self.registry), &self.config)
    }

    /// Run the server until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        self.serve_until(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// In-flight requests get `shutdown_timeout` to complete once the
    /// signal fires; connections still open after that are abandoned.
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        serve_router(
            listener,
            self.router(),
            shutdown,
            self.config.shutdown_timeout,
        )
        .await
    }
}

async fn serve_router<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    shutdown_timeout: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, "HTTP server listening");

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let serve = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::warn!("Shutdown signal received");
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => result?,
        _ = drain_deadline(signalled_rx, shutdown_timeout) => {
            tracing::warn!(
                addr = %local_addr,
                timeout_ms = shutdown_timeout.as_millis() as u64,
                "Graceful shutdown timed out, abandoning open connections"
            );
        }
    }

    tracing::info!(addr = %local_addr, "HTTP server stopped");
    Ok(())
}

/// Resolves `timeout` after the shutdown signal fired, never if it did not
async fn drain_deadline(signalled: oneshot::Receiver<()>, timeout: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(timeout).await;
}
