use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    FlowmapError, Result,
    model::{NodeModel, Position},
    workflow::properties::{NodeProperties, restore_empty, split_empty},
};

/// node id
pub type NodeId = String;

/// Kind of a workflow node.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NodeKind {
    /// Receives an HTTP request.
    HttpInput,
    /// Maps a JSON document onto named variables.
    DataMapper,
    /// Lays out a page from upstream data.
    LayoutDesigner,
    /// Runs a user script over upstream data.
    ScriptProcessor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// node id
    pub id: NodeId,
    /// canvas position, passed through untouched
    pub position: Position,
    /// kind-specific properties, which also determine the node kind
    pub properties: NodeProperties,
    /// `null` and `[]` entries of the imported properties, written back on export
    retained: Map<String, Value>,
}

impl Node {
    pub fn new(
        id: impl Into<NodeId>,
        properties: NodeProperties,
    ) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            properties,
            retained: Map::new(),
        }
    }

    /// Node of `kind` with empty properties.
    pub fn empty(
        id: impl Into<NodeId>,
        kind: NodeKind,
    ) -> Self {
        Self::new(id, NodeProperties::empty(kind))
    }

    pub fn with_position(
        mut self,
        position: Position,
    ) -> Self {
        self.position = position;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.properties.kind()
    }

    pub fn to_model(&self) -> Result<NodeModel> {
        let mut properties = self.properties.to_map()?;
        restore_empty(&mut properties, &self.retained);

        Ok(NodeModel {
            id: self.id.clone(),
            kind: self.kind().as_ref().to_string(),
            position: Some(self.position),
            properties,
        })
    }
}

impl TryFrom<&NodeModel> for Node {
    type Error = FlowmapError;

    fn try_from(model: &NodeModel) -> Result<Self> {
        if model.id.is_empty() {
            return Err(FlowmapError::Structural {
                message: "node has no id".to_string(),
                ids: Vec::new(),
            });
        }
        let kind = NodeKind::from_str(&model.kind).map_err(|_| FlowmapError::Structural {
            message: format!("unrecognized node kind '{}'", model.kind),
            ids: vec![model.id.clone()],
        })?;

        let (parsed, retained) = split_empty(&model.properties);
        Ok(Self {
            id: model.id.clone(),
            position: model.position.unwrap_or_default(),
            properties: NodeProperties::from_map(kind, parsed)?,
            retained,
        })
    }
}
