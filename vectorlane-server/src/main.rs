use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vectorlane_core::MemoryServer;

/// Serve the VectorLane HTTP API backed by an in-memory store
#[derive(Parser, Debug)]
#[command(name = "vectorlane-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(long, default_value_t = 19530)]
    port: u16,

    /// Largest accepted request body, in bytes
    #[arg(long, default_value_t = vectorlane_server::DEFAULT_BODY_LIMIT)]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let app = vectorlane_server::router_with_body_limit(
        Arc::new(MemoryServer::new()),
        args.max_body_bytes,
    );

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!(
        max_body_bytes = args.max_body_bytes,
        "listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await
}
