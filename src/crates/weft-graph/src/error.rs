//! Error types for graph construction, validation and scheduling
//!
//! Every variant here belongs to the startup validation class: a graph that
//! produces any of these errors must never be served.

use thiserror::Error;

/// Errors produced while validating or scheduling a graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// Graph structure validation failed
    #[error("graph validation failed: {0}")]
    Validation(String),

    /// No node declares the origin input tag
    #[error("graph '{0}' has no origin node (no node lists \"http_request\" in its inputs)")]
    MissingOrigin(String),

    /// More than one node declares the origin input tag
    #[error("graph '{graph}' declares multiple origin nodes: {nodes:?}")]
    MultipleOrigins {
        /// Name of the offending graph
        graph: String,
        /// Every node claiming the origin role
        nodes: Vec<String>,
    },

    /// An edge endpoint names neither a declared node nor a virtual marker
    ///
    /// The edge source is carried as `from`: a field called `source` would be
    /// picked up by the derive as the error's cause.
    #[error("edge {from} -> {destination} references undeclared node '{missing}'")]
    DanglingEdge {
        /// Edge source as declared
        from: String,
        /// Edge destination as declared
        destination: String,
        /// The endpoint that failed to resolve
        missing: String,
    },

    /// The edge set contains a dependency cycle
    ///
    /// `nodes` lists every node that could not be scheduled.
    #[error("graph '{graph}' contains a cycle involving: {nodes:?}")]
    Cycle {
        /// Name of the offending graph
        graph: String,
        /// Nodes left with unsatisfied dependencies
        nodes: Vec<String>,
    },

    /// Lookup of a node name that is not part of the graph
    #[error("unknown node '{0}'")]
    UnknownNode(String),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_edge_display_names_both_endpoints() {
        let err = GraphError::DanglingEdge {
            from: "Echo".to_string(),
            destination: "Ghost".to_string(),
            missing: "Ghost".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Echo -> Ghost"));
        assert!(msg.contains("'Ghost'"));
        // Validation errors are root causes, not wrappers.
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_cycle_display_lists_unschedulable_nodes() {
        let err = GraphError::Cycle {
            graph: "loop".to_string(),
            nodes: vec!["a".to_string(), "b".to_string()],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("loop"));
        assert!(msg.contains("\"a\""));
        assert!(msg.contains("\"b\""));
    }
}
