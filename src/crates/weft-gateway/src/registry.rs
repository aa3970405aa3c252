//! Handler channel registry
//!
//! One persistent gRPC channel per graph node, opened eagerly before the
//! gateway accepts its first request. A node whose handler cannot be dialed
//! fails the whole startup rather than surfacing mid-traversal.

use std::collections::HashMap;
use std::time::Duration;

use http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use weft_graph::Graph;

use crate::{GatewayError, Result};

/// An open channel to the handler backing one node
#[derive(Debug, Clone)]
pub struct Handler {
    /// Host the channel points at, kept for logging
    pub host: String,
    /// Persistent HTTP/2 channel; clones share the underlying connection
    pub channel: Channel,
    /// Unary method path the node is invoked on, `/{node}/Serve`
    pub method: PathAndQuery,
}

/// All handler channels for one graph
#[derive(Debug)]
pub struct Registry {
    handlers: HashMap<String, Handler>,
}

impl Registry {
    /// Dial the handler of every node in `graph`; any failure aborts the open
    pub async fn open(
        graph: &Graph,
        connect_timeout: Duration,
        invoke_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut handlers = HashMap::with_capacity(graph.nodes.len());

        for node in &graph.nodes {
            let method: PathAndQuery = format!("/{}/Serve", node.name).parse().map_err(
                |source| GatewayError::MethodPath {
                    node: node.name.clone(),
                    source,
                },
            )?;

            let mut endpoint = Endpoint::from_shared(format!("http://{}", node.host))
                .map_err(|source| GatewayError::Dial {
                    node: node.name.clone(),
                    host: node.host.clone(),
                    source,
                })?
                .connect_timeout(connect_timeout);
            if let Some(timeout) = invoke_timeout {
                endpoint = endpoint.timeout(timeout);
            }

            debug!(node = %node.name, host = %node.host, "dialing handler");
            let channel = endpoint
                .connect()
                .await
                .map_err(|source| GatewayError::Dial {
                    node: node.name.clone(),
                    host: node.host.clone(),
                    source,
                })?;

            handlers.insert(
                node.name.clone(),
                Handler {
                    host: node.host.clone(),
                    channel,
                    method,
                },
            );
        }

        info!(handlers = handlers.len(), "handler registry open");
        Ok(Self { handlers })
    }

    /// Channel for `node`
    pub fn get(&self, node: &str) -> Result<&Handler> {
        self.handlers
            .get(node)
            .ok_or_else(|| GatewayError::Unregistered(node.to_string()))
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Release every channel; tonic closes the connections on drop
    pub fn close_all(self) {
        for (node, handler) in self.handlers {
            debug!(node = %node, host = %handler.host, "closing handler channel");
        }
    }
}
