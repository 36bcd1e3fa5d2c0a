//! Workflow edge definitions for connecting nodes.
//!
//! An edge is a directed dependency: the target consumes what the source
//! publishes.

use serde::{Deserialize, Serialize};

use crate::{model::EdgeModel, utils::random_id, workflow::node::NodeId};

/// Unique identifier for an edge within a workflow.
pub type EdgeId = String;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Unique edge identifier.
    pub id: EdgeId,
    /// ID of the source node.
    pub source: NodeId,
    /// ID of the target node.
    pub target: NodeId,
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Edge with a generated id.
    pub fn connect(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self::new(random_id("edge"), source, target)
    }

    /// Whether this edge touches `node_id` at either end.
    pub fn touches(
        &self,
        node_id: &str,
    ) -> bool {
        self.source == node_id || self.target == node_id
    }
}

impl From<&EdgeModel> for Edge {
    fn from(model: &EdgeModel) -> Self {
        Self::new(model.id.clone(), model.source.clone(), model.target.clone())
    }
}

impl From<&Edge> for EdgeModel {
    fn from(edge: &Edge) -> Self {
        EdgeModel {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
        }
    }
}
