//! Serving side of the node protocol
//!
//! Anything implementing [`NodeHandler`] can back graph nodes. The handler is
//! mounted behind a wildcard gRPC route, so a single process can answer
//! `/{node}/Serve` for every node name the gateway throws at it; the node
//! name is passed through to the implementation.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use futures::future::BoxFuture;
use tonic::codec::ProstCodec;
use tonic::server::{Grpc, UnaryService};
use tonic::Status;
use tracing::debug;

use crate::wire::Context;

/// A handler backing one or more graph nodes
#[async_trait::async_trait]
pub trait NodeHandler: Send + Sync + 'static {
    /// Answer one invocation addressed to `node`
    async fn serve(&self, node: &str, context: Context)
        -> std::result::Result<Context, Status>;
}

/// Mount `handler` as a gRPC service answering `/{node}/Serve` for any node
pub fn grpc_router<H: NodeHandler>(handler: Arc<H>) -> Router {
    Router::new()
        .route("/:node/Serve", post(serve_unary::<H>))
        .with_state(handler)
}

async fn serve_unary<H: NodeHandler>(
    State(handler): State<Arc<H>>,
    Path(node): Path<String>,
    request: axum::http::Request<Body>,
) -> Response {
    debug!(node = %node, "handler invoked");
    let mut grpc = Grpc::new(ProstCodec::<Context, Context>::default());
    let response = grpc.unary(ServeNode { handler, node }, request).await;
    response.map(Body::new)
}

struct ServeNode<H> {
    handler: Arc<H>,
    node: String,
}

impl<H: NodeHandler> UnaryService<Context> for ServeNode<H> {
    type Response = Context;
    type Future = BoxFuture<'static, std::result::Result<tonic::Response<Context>, Status>>;

    fn call(&mut self, request: tonic::Request<Context>) -> Self::Future {
        let handler = self.handler.clone();
        let node = self.node.clone();
        Box::pin(async move {
            let reply = handler.serve(&node, request.into_inner()).await?;
            Ok(tonic::Response::new(reply))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::HttpResponse;

    struct Upper;

    #[async_trait::async_trait]
    impl NodeHandler for Upper {
        async fn serve(
            &self,
            node: &str,
            _context: Context,
        ) -> std::result::Result<Context, Status> {
            if node == "Broken" {
                return Err(Status::failed_precondition("node is broken"));
            }
            let mut reply = Context::default();
            reply
                .insert(
                    "node",
                    &HttpResponse {
                        body: node.to_uppercase(),
                    },
                )
                .map_err(|e| Status::internal(e.to_string()))?;
            Ok(reply)
        }
    }

    #[tokio::test]
    async fn test_serve_node_passes_node_name_through() {
        let mut svc = ServeNode {
            handler: Arc::new(Upper),
            node: "Echo".to_string(),
        };

        let reply = svc
            .call(tonic::Request::new(Context::default()))
            .await
            .unwrap()
            .into_inner();
        let body: HttpResponse = reply.get("node").unwrap().unwrap();
        assert_eq!(body.body, "ECHO");
    }

    #[tokio::test]
    async fn test_serve_node_propagates_handler_status() {
        let mut svc = ServeNode {
            handler: Arc::new(Upper),
            node: "Broken".to_string(),
        };

        let status = svc
            .call(tonic::Request::new(Context::default()))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);
    }
}
