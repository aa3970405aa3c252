//! Demo handler binary
//!
//! Answers every node invocation with a fixed greeting, so a single process
//! can back an entire graph during development. Pointing all hosts of the
//! sample graph document at this binary gives a working end-to-end setup.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use tonic::Status;

use weft_gateway::{grpc_router, Context, HttpResponse, NodeHandler};
use weft_graph::RESPONSE_KEY;

/// Echo handler answering every graph node
#[derive(Parser, Debug)]
#[command(name = "weft-echo", version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 8081, env = "WEFT_ECHO_PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "WEFT_ECHO_HOST")]
    host: String,

    /// Greeting carried in every reply
    #[arg(long, default_value = "hello", env = "WEFT_ECHO_MESSAGE")]
    message: String,
}

struct EchoHandler {
    message: String,
}

#[async_trait]
impl NodeHandler for EchoHandler {
    async fn serve(&self, node: &str, _context: Context) -> Result<Context, Status> {
        let mut reply = Context::default();
        reply
            .insert(
                RESPONSE_KEY,
                &HttpResponse {
                    body: format!("{} from {}", self.message, node),
                },
            )
            .map_err(|e| Status::internal(e.to_string()))?;
        Ok(reply)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    let args = Args::parse();
    let handler = Arc::new(EchoHandler {
        message: args.message,
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    tracing::info!("Starting weft echo handler on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, grpc_router(handler).into_make_service()).await?;

    Ok(())
}
