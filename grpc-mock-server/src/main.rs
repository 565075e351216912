//! grpc-mock — plaintext gRPC server answering from session fixtures.
//!
//! Reads config from flags or env vars (a `.env` file is honoured):
//!   GRPC_MOCK_SESSIONS_DIR — session root (default: ./sessions)
//!   GRPC_MOCK_PROTO_DIR    — .proto directory (default: <sessions>/protos)
//!   GRPC_MOCK_HOST / GRPC_MOCK_PORT — listen address (default: 0.0.0.0:50051)
//!   GRPC_MOCK_SESSION      — initial session name (optional)

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use grpc_mock_core::{mount, CallDispatcher, FsMockStore, MockServer, SharedSession};
use tonic::transport::Server;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,grpc_mock_core=debug".into()),
        )
        .init();

    let config = Config::parse();

    let sessions = match &config.session {
        Some(name) => SharedSession::started(name.as_str(), &config.sessions_dir),
        None => {
            tracing::warn!("No initial session; calls answer UNAVAILABLE until one starts");
            SharedSession::new()
        }
    };

    let dispatcher = Arc::new(CallDispatcher::new(
        Arc::new(sessions.clone()),
        Arc::new(FsMockStore::new()),
    ));

    let proto_dir = config.proto_dir();
    let mut server = MockServer::new();
    mount(&proto_dir, &dispatcher, &mut server).with_context(|| {
        format!(
            "Loading protocol descriptions from {}",
            proto_dir.display()
        )
    })?;
    if server.is_empty() {
        tracing::warn!("No methods bound; every call will be rejected");
    }

    let addr = config.addr();
    tracing::info!("gRPC server running at {addr}");

    Server::builder()
        .add_routes(server.into_routes())
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .context("gRPC server error")?;

    tracing::info!("gRPC server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
