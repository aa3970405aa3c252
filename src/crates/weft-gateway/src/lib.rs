//! # weft-gateway - DAG gateway service
//!
//! The service half of the weft gateway: persistent gRPC channels to the
//! handlers backing each graph node, the per-request traversal engine and the
//! public HTTP surface. The graph itself - model, validation, scheduling,
//! rendering - lives in [`weft_graph`].
//!
//! One inbound HTTP request is answered by invoking every node of the
//! configured graph in dependency order, accumulating handler replies in a
//! per-request execution context and decoding the final `http_response`
//! entry into the body sent back to the caller.

pub mod api;
pub mod config;
pub mod handler;
pub mod registry;
pub mod router;
pub mod wire;

use thiserror::Error;

/// Errors that can occur while running the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The configured graph failed validation; fatal at startup
    #[error(transparent)]
    Graph(#[from] weft_graph::GraphError),

    /// A handler host could not be dialed while opening the registry; fatal at startup
    #[error("failed to dial node '{node}' at {host}")]
    Dial {
        node: String,
        host: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// A node name does not form a valid gRPC method path; fatal at startup
    #[error("invalid method path for node '{node}'")]
    MethodPath {
        node: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    /// A handler invocation failed; fails the request being traversed
    #[error("invoking node '{node}' failed: {status}")]
    Invoke { node: String, status: tonic::Status },

    /// A context entry could not be unpacked into the expected message type
    #[error("decoding context key '{key}' failed")]
    Decode {
        key: String,
        #[source]
        source: prost::DecodeError,
    },

    /// Traversal finished without producing the terminal response entry
    #[error("context is missing response key '{0}'")]
    MissingResponse(String),

    /// Reading or parsing the graph document failed
    #[error("configuration error: {0}")]
    Config(String),

    /// Lookup of a node that has no registered channel
    #[error("no channel registered for node '{0}'")]
    Unregistered(String),
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

pub use handler::{grpc_router, NodeHandler};
pub use router::{RequestRouter, RouterOptions};
pub use wire::{Context, HttpRequest, HttpResponse};
