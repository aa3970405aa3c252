//! # weft-graph - Static DAG model and scheduling
//!
//! The engine crate of the weft gateway: an immutable graph of remote
//! handlers, validated once at startup, scheduled with Kahn's algorithm and
//! rendered for operators. All logic here is pure in-memory work; dialing,
//! invocation and HTTP belong to `weft-gateway`.
//!
//! ## Core Concepts
//!
//! - **Graph**: nodes (remote handlers addressed by `host`), edges (data
//!   dependencies), and two virtual markers denoting graph entry
//!   (`origin_http_request`) and exit (`origin_http_response`).
//! - **Origin**: the unique node whose `inputs` contains `"http_request"`;
//!   validation rejects graphs with zero or multiple origins.
//! - **Waves**: dependency levels computed by [`schedule::execution_waves`];
//!   every node in a wave has all of its predecessors in earlier waves, so a
//!   wave's nodes can be invoked concurrently.
//!
//! ## Quick Start
//!
//! ```rust
//! use weft_graph::{Edge, Graph, Node, ORIGIN_INPUT, RESPONSE_KEY};
//!
//! let graph = Graph::new("hello")
//!     .with_node(Node::new("entry", "localhost:8081", "entry_out").with_input(ORIGIN_INPUT))
//!     .with_node(Node::new("exit", "localhost:8082", RESPONSE_KEY).with_input("entry_out"))
//!     .with_edge(Edge::new("entry", "exit"));
//!
//! graph.validate().unwrap();
//! let order = weft_graph::schedule::execution_order(&graph).unwrap();
//! assert_eq!(order, vec!["entry", "exit"]);
//! ```

pub mod error;
pub mod graph;
pub mod render;
pub mod schedule;

pub use error::{GraphError, Result};
pub use graph::{
    Edge, Graph, Node, ORIGIN_INPUT, RESPONSE_KEY, VIRTUAL_SINK, VIRTUAL_SOURCE,
};
pub use render::{render, RenderFormat, RenderOptions};
pub use schedule::{execution_order, execution_waves};
