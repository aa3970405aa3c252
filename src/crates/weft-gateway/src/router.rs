//! Per-request graph traversal
//!
//! The [`RequestRouter`] owns the validated graph, its precomputed wave
//! schedule and the open handler registry. Each inbound request walks the
//! waves: the origin node is invoked first with the raw [`HttpRequest`],
//! every later node receives a snapshot of the full execution context, and
//! sibling nodes inside a wave are invoked concurrently. Replies merge back
//! into the context in wave order, last writer wins per key.

use std::collections::HashMap;
use std::time::Duration;

use futures::future;
use prost::Message;
use prost_types::Any;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::{Request, Status};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use weft_graph::{execution_waves, Graph, RESPONSE_KEY};

use crate::registry::Registry;
use crate::wire::{Context, HttpRequest, HttpResponse};
use crate::{GatewayError, Result};

/// Tunables for opening and invoking handler channels
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Connect timeout per handler channel at startup
    pub connect_timeout: Duration,
    /// Deadline applied to every handler invocation; `None` leaves calls unbounded
    pub invoke_timeout: Option<Duration>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            invoke_timeout: None,
        }
    }
}

impl RouterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-channel connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound every handler invocation by `timeout`
    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = Some(timeout);
        self
    }
}

/// The traversal engine; one per process, shared across requests
#[derive(Debug)]
pub struct RequestRouter {
    graph: Graph,
    waves: Vec<Vec<String>>,
    registry: Registry,
}

impl RequestRouter {
    /// Validate `graph`, compute its wave schedule and dial every handler.
    ///
    /// Any validation or dial failure is fatal; a router that connected
    /// successfully can invoke every node of its graph.
    pub async fn connect(graph: Graph, options: RouterOptions) -> Result<Self> {
        graph.validate()?;
        let waves = execution_waves(&graph)?;
        let registry =
            Registry::open(&graph, options.connect_timeout, options.invoke_timeout).await?;

        info!(
            graph = %graph.name,
            handlers = registry.len(),
            waves = waves.len(),
            "request router ready"
        );
        Ok(Self {
            graph,
            waves,
            registry,
        })
    }

    /// The graph this router serves
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Fulfil one inbound request by traversing the whole graph
    pub async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let span = info_span!("request", id = %Uuid::new_v4());
        self.traverse(request).instrument(span).await
    }

    /// Release every handler channel; called once at orderly shutdown
    pub fn close(self) {
        self.registry.close_all();
    }

    async fn traverse(&self, request: HttpRequest) -> Result<HttpResponse> {
        let origin = self.graph.origin()?;
        let mut context: HashMap<String, Any> = HashMap::new();

        // The origin is the only node that sees the raw HTTP request
        debug!(
            node = %origin.name,
            method = %request.method,
            path = %request.path,
            "invoking origin"
        );
        let reply: Context = self.invoke(&origin.name, request).await?;
        match reply.data.get(RESPONSE_KEY) {
            Some(seed) => {
                context.insert(origin.output.clone(), seed.clone());
            }
            None => {
                debug!(node = %origin.name, "origin reply has no '{}' entry", RESPONSE_KEY);
            }
        }

        for wave in &self.waves {
            let pending: Vec<&str> = wave
                .iter()
                .map(String::as_str)
                .filter(|name| *name != origin.name)
                .collect();
            if pending.is_empty() {
                continue;
            }

            // Every node in the wave sees the same context snapshot; merges
            // only happen once the whole wave has answered
            debug!(nodes = ?pending, "dispatching wave");
            let calls: Vec<_> = pending
                .iter()
                .map(|name| {
                    let payload = Context {
                        data: context.clone(),
                    };
                    self.invoke_node(name, payload)
                })
                .collect();

            for (name, reply) in future::try_join_all(calls).await? {
                merge_reply(&mut context, &name, reply);
            }
        }

        let terminal = context
            .remove(RESPONSE_KEY)
            .ok_or_else(|| GatewayError::MissingResponse(RESPONSE_KEY.to_string()))?;
        let response = terminal
            .to_msg::<HttpResponse>()
            .map_err(|source| GatewayError::Decode {
                key: RESPONSE_KEY.to_string(),
                source,
            })?;

        debug!(bytes = response.body.len(), "traversal complete");
        Ok(response)
    }

    async fn invoke_node(&self, node: &str, payload: Context) -> Result<(String, Context)> {
        debug!(node = %node, "invoking handler");
        let reply = self.invoke(node, payload).await?;
        Ok((node.to_string(), reply))
    }

    /// One unary call against the channel registered for `node`
    async fn invoke<Req, Resp>(&self, node: &str, payload: Req) -> Result<Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let handler = self.registry.get(node)?;
        let mut grpc = Grpc::new(handler.channel.clone());
        grpc.ready().await.map_err(|err| GatewayError::Invoke {
            node: node.to_string(),
            status: Status::unknown(format!("channel not ready: {err}")),
        })?;

        let response = grpc
            .unary(
                Request::new(payload),
                handler.method.clone(),
                ProstCodec::<Req, Resp>::default(),
            )
            .await
            .map_err(|status| GatewayError::Invoke {
                node: node.to_string(),
                status,
            })?;
        Ok(response.into_inner())
    }
}

/// Fold one handler reply into the request context, last writer wins
fn merge_reply(context: &mut HashMap<String, Any>, node: &str, reply: Context) {
    for (key, value) in reply.data {
        if context.contains_key(&key) {
            debug!(node = %node, key = %key, "context key overwritten");
        }
        context.insert(key, value);
    }
}
