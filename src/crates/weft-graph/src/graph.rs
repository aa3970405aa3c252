//! Graph data model and validation
//!
//! A [`Graph`] is parsed once from the configuration document at startup and
//! never changes afterwards. [`Graph::validate`] rejects structurally unsound
//! graphs before the gateway accepts traffic; everything downstream (the
//! scheduler, the registry, the router) assumes a validated graph.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::schedule;

/// Input tag that marks a node as the graph's origin
pub const ORIGIN_INPUT: &str = "http_request";

/// Context key the terminal response value is read from
pub const RESPONSE_KEY: &str = "http_response";

/// Virtual edge source marking graph entry
pub const VIRTUAL_SOURCE: &str = "origin_http_request";

/// Virtual edge destination marking graph exit
pub const VIRTUAL_SINK: &str = "origin_http_response";

/// One remote handler in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node name; also names the gRPC service the handler answers
    pub name: String,
    /// Connection address of the handler, `host:port`
    pub host: String,
    /// Declared input-kind tags; the tag `"http_request"` marks the origin
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Context key this node's reply is expected to populate
    pub output: String,
}

impl Node {
    /// Create a node with no declared inputs
    pub fn new(name: impl Into<String>, host: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            inputs: Vec::new(),
            output: output.into(),
        }
    }

    /// Add a declared input tag
    pub fn with_input(mut self, tag: impl Into<String>) -> Self {
        self.inputs.push(tag.into());
        self
    }

    /// Whether this node is the graph's origin
    pub fn is_origin(&self) -> bool {
        self.inputs.iter().any(|tag| tag == ORIGIN_INPUT)
    }
}

/// A data dependency between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Source node name, or the virtual entry marker
    pub source: String,
    /// Destination node name, or the virtual exit marker
    pub destination: String,
    /// Reserved gating predicates; parsed and retained, no runtime semantics
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl Edge {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            conditions: Vec::new(),
        }
    }
}

/// A statically declared DAG of remote handlers
///
/// Node declaration order is the graph's fixed internal ordering; the
/// scheduler uses it as the deterministic tie-break among ready nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name, used in logs and rendered output
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Add a node
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add an edge
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Whether `name` is one of the two virtual edge markers
    pub fn is_virtual(name: &str) -> bool {
        name == VIRTUAL_SOURCE || name == VIRTUAL_SINK
    }

    /// Reject structurally invalid graphs
    ///
    /// Checks, in order: node names are unique and do not collide with the
    /// virtual markers; exactly one node declares the origin input tag; every
    /// edge endpoint resolves to a declared node or a virtual marker; the
    /// edge set is acyclic. A cycle surfaces here, never at traversal time.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if Self::is_virtual(&node.name) {
                return Err(GraphError::Validation(format!(
                    "node name '{}' collides with a virtual marker",
                    node.name
                )));
            }
            if !seen.insert(node.name.as_str()) {
                return Err(GraphError::Validation(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
        }

        let origins: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| node.is_origin())
            .map(|node| node.name.clone())
            .collect();
        match origins.len() {
            0 => return Err(GraphError::MissingOrigin(self.name.clone())),
            1 => {}
            _ => {
                return Err(GraphError::MultipleOrigins {
                    graph: self.name.clone(),
                    nodes: origins,
                })
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.destination] {
                if !Self::is_virtual(endpoint) && !seen.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        from: edge.source.clone(),
                        destination: edge.destination.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        schedule::execution_order(self)?;

        debug!(
            graph = %self.name,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "graph validated"
        );
        Ok(())
    }

    /// Resolve a node by name
    pub fn node(&self, name: &str) -> Result<&Node> {
        self.nodes
            .iter()
            .find(|node| node.name == name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
    }

    /// The unique origin node
    ///
    /// Meaningful only on a validated graph; an unvalidated graph may hold
    /// several claimants, in which case the first declared one is returned.
    pub fn origin(&self) -> Result<&Node> {
        self.nodes
            .iter()
            .find(|node| node.is_origin())
            .ok_or_else(|| GraphError::MissingOrigin(self.name.clone()))
    }
}
