//! # voxlink-app
//!
//! Relay binary — builds the link controller, mounts the HTTP surface on
//! it, and runs until interrupted.

#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use voxlink_peer::LinkController;
use voxlink_server::config::ServerConfig;
use voxlink_server::server::RelayServer;

/// Browser-to-TCP voice relay.
#[derive(Parser, Debug)]
#[command(name = "voxlink", about = "Browser-to-TCP voice relay")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind; falls back to `$PORT`, then 5000.
    #[arg(long)]
    port: Option<u16>,

    /// Bound on outbound peer connects, in seconds.
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let config = ServerConfig {
        host: args.host,
        port: ServerConfig::resolve_port(args.port),
        connect_timeout_secs: args.connect_timeout,
    };

    let link = Arc::new(
        LinkController::new()
            .with_connect_timeout(Duration::from_secs(config.connect_timeout_secs)),
    );
    let server = RelayServer::new(config, link.clone());

    let (addr, serve_handle) = server
        .listen()
        .await
        .context("failed to bind the HTTP listener")?;
    tracing::info!(%addr, "voxlink ready");

    server.shutdown().wait_for_signal().await;

    // Close the peer link before the listener goes away so the receiver
    // task is joined, not abandoned.
    if link.snapshot().connected {
        if let Err(e) = link.disconnect().await {
            tracing::warn!(error = %e, "link teardown during shutdown failed");
        }
    }

    serve_handle.await.context("http server task panicked")?;
    tracing::info!("bye");
    Ok(())
}
