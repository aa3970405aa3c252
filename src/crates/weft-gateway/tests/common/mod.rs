//! Shared handler doubles and graph fixtures for integration tests

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tonic::Status;

use weft_gateway::{grpc_router, Context, HttpResponse, NodeHandler};
use weft_graph::{
    Edge, Graph, Node, ORIGIN_INPUT, RESPONSE_KEY, VIRTUAL_SINK, VIRTUAL_SOURCE,
};

/// Recording handler backing every node of a test graph
///
/// Tracks which nodes were invoked and which context keys each invocation
/// carried. A node listed via [`fail_next`](Self::fail_next) answers its next
/// invocation with `UNAVAILABLE` and recovers afterwards.
pub struct ScriptedHandler {
    invocations: Mutex<Vec<String>>,
    seen_keys: Mutex<HashMap<String, Vec<String>>>,
    fail_once: Mutex<HashSet<String>>,
}

impl ScriptedHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            invocations: Mutex::new(Vec::new()),
            seen_keys: Mutex::new(HashMap::new()),
            fail_once: Mutex::new(HashSet::new()),
        })
    }

    /// Make the next invocation of `node` fail
    pub fn fail_next(&self, node: &str) {
        self.fail_once.lock().unwrap().insert(node.to_string());
    }

    /// Every invocation so far, in arrival order
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    /// Sorted context keys of the most recent invocation of `node`
    pub fn keys_seen_by(&self, node: &str) -> Vec<String> {
        self.seen_keys
            .lock()
            .unwrap()
            .get(node)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl NodeHandler for ScriptedHandler {
    async fn serve(&self, node: &str, context: Context) -> Result<Context, Status> {
        let mut keys: Vec<String> = context.data.keys().cloned().collect();
        keys.sort();
        self.invocations.lock().unwrap().push(node.to_string());
        self.seen_keys.lock().unwrap().insert(node.to_string(), keys);

        if self.fail_once.lock().unwrap().remove(node) {
            return Err(Status::unavailable(format!("{node} is down")));
        }

        let mut reply = Context::default();
        reply
            .insert(
                RESPONSE_KEY,
                &HttpResponse {
                    body: format!("hello from {node}"),
                },
            )
            .map_err(|e| Status::internal(e.to_string()))?;
        reply
            .insert(
                format!("{}_mark", node.to_lowercase()),
                &HttpResponse {
                    body: node.to_string(),
                },
            )
            .map_err(|e| Status::internal(e.to_string()))?;
        Ok(reply)
    }
}

/// Serve `handler` on an ephemeral loopback port
pub async fn spawn_handler<H: NodeHandler>(handler: Arc<H>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind handler listener");
    let addr = listener
        .local_addr()
        .expect("Failed to read handler address");
    let app = grpc_router(handler);
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("Handler server failed");
    });
    addr
}

/// The seven-node sample graph, every node backed by `host`
pub fn sample_graph(host: &str) -> Graph {
    Graph::new("sample")
        .with_node(Node::new("Echo", host, "echo_data").with_input(ORIGIN_INPUT))
        .with_node(Node::new("Foo", host, "foo_data").with_input("echo_data"))
        .with_node(Node::new("Bar", host, "bar_data").with_input("echo_data"))
        .with_node(Node::new("Hui", host, "hui_data").with_input("echo_data"))
        .with_node(Node::new("Zhopa", host, "zhopa_data").with_input("hui_data"))
        .with_node(
            Node::new("Spam", host, "spam_data")
                .with_input("foo_data")
                .with_input("bar_data"),
        )
        .with_node(
            Node::new("Bobik", host, RESPONSE_KEY)
                .with_input("zhopa_data")
                .with_input("spam_data"),
        )
        .with_edge(Edge::new(VIRTUAL_SOURCE, "Echo"))
        .with_edge(Edge::new("Echo", "Foo"))
        .with_edge(Edge::new("Echo", "Bar"))
        .with_edge(Edge::new("Echo", "Hui"))
        .with_edge(Edge::new("Hui", "Zhopa"))
        .with_edge(Edge::new("Foo", "Spam"))
        .with_edge(Edge::new("Bar", "Spam"))
        .with_edge(Edge::new("Zhopa", "Bobik"))
        .with_edge(Edge::new("Spam", "Bobik"))
        .with_edge(Edge::new("Bobik", VIRTUAL_SINK))
}

/// A single-node graph whose origin must produce the terminal response itself
pub fn single_node_graph(host: &str) -> Graph {
    Graph::new("single")
        .with_node(Node::new("Solo", host, RESPONSE_KEY).with_input(ORIGIN_INPUT))
        .with_edge(Edge::new(VIRTUAL_SOURCE, "Solo"))
        .with_edge(Edge::new("Solo", VIRTUAL_SINK))
}
