use serde::{Deserialize, Serialize};

use crate::{
    FlowmapError, Result,
    model::{EdgeModel, NodeModel, Position},
    utils,
};

/// Version written into exported documents.
pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<String>,
    #[serde(default)]
    pub total_nodes: usize,
    #[serde(default)]
    pub total_edges: usize,
}

/// Exported workflow document.
///
/// `position` and `metadata` are passed through for the rendering layer;
/// the core only reads nodes, edges and properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowModel {
    #[serde(default)]
    pub nodes: Vec<NodeModel>,
    #[serde(default)]
    pub edges: Vec<EdgeModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl WorkflowModel {
    /// Parses a document without normalizing it.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str::<WorkflowModel>(s).map_err(|e| FlowmapError::Parse(e.to_string()))
    }

    /// Parses a document and fills in missing metadata, timestamp and positions.
    pub fn import(s: &str) -> Result<Self> {
        let mut model = Self::from_json(s)?;
        model.normalize();
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fills defaults for everything an import may omit.
    pub fn normalize(&mut self) {
        let now = utils::time::now_rfc3339();

        for node in self.nodes.iter_mut() {
            node.position.get_or_insert_with(Position::default);
        }

        let (total_nodes, total_edges) = (self.nodes.len(), self.edges.len());
        self.metadata.get_or_insert_with(|| Metadata {
            version: DOCUMENT_VERSION.to_string(),
            created_at: None,
            imported_at: Some(now.clone()),
            total_nodes,
            total_edges,
        });
        self.timestamp.get_or_insert(now);
    }
}
