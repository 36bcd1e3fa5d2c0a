//! Error types for Flowmap.
//!
//! All errors in Flowmap are represented by the `FlowmapError` enum,
//! which provides specific variants for different error categories.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Flowmap operations.
///
/// Structural and cycle errors block saving or executing a workflow.
/// Non-blocking findings are reported as [`ValidationWarning`](crate::ValidationWarning)
/// instead and never surface through this type.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum FlowmapError {
    /// Malformed node or edge reference, duplicate id, unknown kind.
    #[error("{message}: [{}]", .ids.join(", "))]
    Structural {
        message: String,
        ids: Vec<String>,
    },

    /// A node with the same id already exists.
    #[error("node '{0}' already exists")]
    DuplicateNode(String),

    /// An edge with the same (source, target) pair already exists.
    #[error("edge {from} -> {to} already exists")]
    DuplicateEdge {
        from: String,
        to: String,
    },

    /// An edge would connect a node to itself.
    #[error("edge would connect node '{0}' to itself")]
    SelfLoop(String),

    #[error("node '{0}' not found")]
    NodeNotFound(String),

    #[error("edge '{0}' not found")]
    EdgeNotFound(String),

    /// Properties do not belong to the node's kind.
    #[error("node '{node}' is '{expected}', got '{found}' properties")]
    KindMismatch {
        node: String,
        expected: String,
        found: String,
    },

    /// The dependency graph contains a loop.
    #[error("cycle detected at node '{node}' ({})", .path.join(" -> "))]
    Cycle {
        node: String,
        path: Vec<String>,
    },

    /// Invalid JSON text given to the mapping engine.
    #[error("invalid json document: {0}")]
    Parse(String),

    /// The document nests deeper than the configured limit.
    #[error("maximum depth {max_depth} exceeded at '{path}'")]
    DepthExceeded {
        max_depth: usize,
        path: String,
    },

    /// Two upstream sources publish the same key.
    #[error("key '{key}' is published by more than one source: [{}]", .sources.join(", "))]
    Collision {
        key: String,
        sources: Vec<String>,
    },

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl FlowmapError {
    /// Returns the ids this error refers to, if any.
    pub fn ids(&self) -> Vec<String> {
        match self {
            FlowmapError::Structural {
                ids,
                ..
            } => ids.clone(),
            FlowmapError::DuplicateNode(id) | FlowmapError::SelfLoop(id) | FlowmapError::NodeNotFound(id) | FlowmapError::EdgeNotFound(id) => vec![id.clone()],
            FlowmapError::DuplicateEdge {
                from,
                to,
            } => vec![from.clone(), to.clone()],
            FlowmapError::KindMismatch {
                node,
                ..
            } => vec![node.clone()],
            FlowmapError::Cycle {
                path,
                ..
            } => path.clone(),
            FlowmapError::Collision {
                sources,
                ..
            } => sources.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<FlowmapError> for String {
    fn from(val: FlowmapError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for FlowmapError {
    fn from(error: std::io::Error) -> Self {
        FlowmapError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for FlowmapError {
    fn from(error: serde_json::Error) -> Self {
        FlowmapError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for FlowmapError {
    fn from(error: toml::de::Error) -> Self {
        FlowmapError::Config(error.to_string())
    }
}

/// Non-blocking finding surfaced to the user.
///
/// Warnings never prevent a workflow from being saved or executed.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Node without incoming or outgoing edges.
    IsolatedNode {
        node_id: String,
    },
    /// More than one published mapping uses the same variable name.
    DuplicateVariableName {
        name: String,
        mapping_ids: Vec<String>,
    },
    /// An optional property is not set.
    MissingField {
        node_id: String,
        field: String,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ValidationWarning::IsolatedNode {
                node_id,
            } => write!(f, "node '{}' is not connected to any other node", node_id),
            ValidationWarning::DuplicateVariableName {
                name,
                mapping_ids,
            } => write!(f, "variable '{}' is published by {} mappings", name, mapping_ids.len()),
            ValidationWarning::MissingField {
                node_id,
                field,
            } => write!(f, "node '{}' has no '{}'", node_id, field),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{FlowmapError, ValidationWarning};

    #[test]
    fn test_structural_lists_ids() {
        let err = FlowmapError::Structural {
            message: "duplicate node ids".to_string(),
            ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "duplicate node ids: [a, b]");
        assert_eq!(err.ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_cycle_message() {
        let err = FlowmapError::Cycle {
            node: "A".to_string(),
            path: vec!["A".to_string(), "B".to_string(), "C".to_string()],
        };
        assert_eq!(err.to_string(), "cycle detected at node 'A' (A -> B -> C)");
    }

    #[test]
    fn test_json_error_converts() {
        let err: FlowmapError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, FlowmapError::Convert(_)));
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = ValidationWarning::IsolatedNode {
            node_id: "n1".to_string(),
        };
        assert_eq!(serde_json::to_value(&warning).unwrap(), serde_json::json!({"kind": "isolated_node", "node_id": "n1"}));
        assert_eq!(warning.to_string(), "node 'n1' is not connected to any other node");
    }
}
