use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canvas coordinate used when a node carries no position.
pub const FALLBACK_POSITION: Position = Position {
    x: 100.0,
    y: 100.0,
};

/// Canvas position of a node. Opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Default for Position {
    fn default() -> Self {
        FALLBACK_POSITION
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeModel {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}
