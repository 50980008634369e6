//! Stream lifecycle REST service
//!
//! Run with: cargo run -- [--port 8080] [--finish-after 10]
//!
//! Every option can also be given through the environment (`API_PORT`,
//! `API_BIND`, `FINISH_AFTER`). Log verbosity follows `RUST_LOG`.
//!
//! ```text
//! curl -X POST localhost:8080/v1/streams/
//! curl -X POST localhost:8080/v1/streams/<id>/start
//! curl -X POST localhost:8080/v1/streams/<id>/stop
//! curl localhost:8080/v1/streams/
//! curl -X DELETE localhost:8080/v1/streams/<id>
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use stream_api::{ApiServer, RegistryConfig, ServerConfig, StreamRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080, env = "API_PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), env = "API_BIND")]
    bind: IpAddr,

    /// Finish interrupted streams after this many seconds
    #[arg(long, default_value_t = 10, env = "FINISH_AFTER")]
    finish_after: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stream_api=info,tower_http=info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        finish_after_secs = args.finish_after,
        "started stream-api"
    );

    let registry = Arc::new(StreamRegistry::with_config(RegistryConfig::from_secs(
        args.finish_after,
    )));
    let config = ServerConfig::with_addr(SocketAddr::new(args.bind, args.port))
        .version(env!("CARGO_PKG_VERSION"));

    let server = ApiServer::new(config, registry);
    server.run_until(shutdown_signal()).await?;

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
