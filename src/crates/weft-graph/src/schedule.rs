//! Topological scheduling over a validated graph
//!
//! Kahn's algorithm in two shapes: [`execution_waves`] groups nodes into
//! dependency waves (every node in a wave has all of its predecessors in
//! earlier waves) and [`execution_order`] flattens the waves into a linear
//! order. In-degree counts only edges between real nodes, so the virtual
//! markers never block readiness. Ties resolve in node declaration order,
//! which makes both shapes deterministic for a fixed graph.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::Graph;

/// Group every node into dependency waves
///
/// Wave 0 holds all nodes with no real incoming edge; each following wave
/// holds the nodes whose remaining dependencies were satisfied by the wave
/// before it. Nodes that can never be placed indicate a cycle and are
/// reported in the error. Pure function of the graph; callers cache the
/// result for the graph's lifetime.
pub fn execution_waves(graph: &Graph) -> Result<Vec<Vec<String>>> {
    let mut in_degree: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .map(|node| (node.name.as_str(), 0))
        .collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

    for edge in &graph.edges {
        if Graph::is_virtual(&edge.source) || Graph::is_virtual(&edge.destination) {
            continue;
        }
        if !in_degree.contains_key(edge.source.as_str()) {
            return Err(GraphError::UnknownNode(edge.source.clone()));
        }
        match in_degree.get_mut(edge.destination.as_str()) {
            Some(degree) => *degree += 1,
            None => return Err(GraphError::UnknownNode(edge.destination.clone())),
        }
        successors
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.destination.as_str());
    }

    let mut placed: HashSet<&str> = HashSet::with_capacity(graph.nodes.len());
    let mut waves: Vec<Vec<String>> = Vec::new();

    loop {
        let wave: Vec<&str> = graph
            .nodes
            .iter()
            .map(|node| node.name.as_str())
            .filter(|name| !placed.contains(name) && in_degree[name] == 0)
            .collect();
        if wave.is_empty() {
            break;
        }
        for name in &wave {
            placed.insert(name);
            if let Some(children) = successors.get(name) {
                for child in children {
                    if let Some(degree) = in_degree.get_mut(child) {
                        *degree -= 1;
                    }
                }
            }
        }
        waves.push(wave.into_iter().map(String::from).collect());
    }

    if placed.len() != graph.nodes.len() {
        let residual: Vec<String> = graph
            .nodes
            .iter()
            .filter(|node| !placed.contains(node.name.as_str()))
            .map(|node| node.name.clone())
            .collect();
        return Err(GraphError::Cycle {
            graph: graph.name.clone(),
            nodes: residual,
        });
    }

    debug!(graph = %graph.name, waves = waves.len(), "computed execution waves");
    Ok(waves)
}

/// The wave schedule flattened into a linear order
///
/// Satisfies: for every edge (u, v) between real nodes, u appears before v.
pub fn execution_order(graph: &Graph) -> Result<Vec<String>> {
    Ok(execution_waves(graph)?.into_iter().flatten().collect())
}
