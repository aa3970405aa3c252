//! Gateway server binary
//!
//! Loads the graph document, dials every handler and serves the public HTTP
//! surface until Ctrl-C or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use weft_gateway::api::create_router;
use weft_gateway::config::load_graph;
use weft_gateway::{RequestRouter, RouterOptions};

/// DAG gateway over remote gRPC handlers
#[derive(Parser, Debug)]
#[command(name = "weft-server", version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8080, env = "WEFT_PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "WEFT_HOST")]
    host: String,

    /// Path to the graph document (YAML, or JSON for .json files)
    #[arg(long, default_value = "config/graph.yaml", env = "WEFT_GRAPH")]
    graph: PathBuf,

    /// Handler connect timeout at startup, in milliseconds
    #[arg(long, default_value_t = 5000, env = "WEFT_CONNECT_TIMEOUT_MS")]
    connect_timeout_ms: u64,

    /// Per-invocation deadline in milliseconds; 0 leaves calls unbounded
    #[arg(long, default_value_t = 0, env = "WEFT_INVOKE_TIMEOUT_MS")]
    invoke_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing/logging
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    let args = Args::parse();

    tracing::info!("Loading graph document from {}", args.graph.display());
    let graph = load_graph(&args.graph)?;
    tracing::info!(
        "Graph '{}': {} nodes, {} edges",
        graph.name,
        graph.nodes.len(),
        graph.edges.len()
    );

    let mut options =
        RouterOptions::new().with_connect_timeout(Duration::from_millis(args.connect_timeout_ms));
    if args.invoke_timeout_ms > 0 {
        options = options.with_invoke_timeout(Duration::from_millis(args.invoke_timeout_ms));
    }

    // Validation or dial failures terminate the process before the listener binds
    let router = Arc::new(RequestRouter::connect(graph, options).await?);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let app = create_router(router.clone());

    tracing::info!("Starting weft gateway on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Ok(router) = Arc::try_unwrap(router) {
        router.close();
    }
    tracing::info!("weft gateway shut down gracefully");
    Ok(())
}

/// Signal for graceful shutdown (Ctrl-C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}
