//! Data availability.
//!
//! Collects what the direct upstream neighbours of a node publish into one
//! flat map. Keys are namespaced by the source's kind (or id) and merged in
//! edge order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::{
    FlowmapError, Result,
    workflow::{Edge, Node},
};

/// How to merge two upstream sources publishing the same namespaced key.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CollisionPolicy {
    /// The source of the later edge overwrites.
    #[default]
    LastWriteWins,
    /// The source of the earlier edge is kept.
    FirstWriteWins,
    /// Fail with [`FlowmapError::Collision`].
    Reject,
    /// Namespace by source node id instead of kind, so keys never collide.
    NamespaceByNode,
}

/// Merges the published data of every node with an edge into `node_id`.
///
/// Data mappers contribute their output variables, other kinds their raw
/// properties. Keys become `"<kind>.<key>"`, or `"<nodeId>.<key>"` under
/// [`CollisionPolicy::NamespaceByNode`]. Edges whose source does not exist
/// are skipped.
pub fn resolve_available_data(
    node_id: &str,
    nodes: &[Node],
    edges: &[Edge],
    policy: CollisionPolicy,
) -> Result<Map<String, Value>> {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut data = Map::new();
    let mut owners: HashMap<String, &str> = HashMap::new();

    for edge in edges.iter().filter(|e| e.target == node_id) {
        let Some(source) = by_id.get(edge.source.as_str()) else {
            warn!(edge = %edge.id, source = %edge.source, "edge source not found");
            continue;
        };

        let kind = source.kind();
        let namespace = match policy {
            CollisionPolicy::NamespaceByNode => source.id.as_str(),
            _ => kind.as_ref(),
        };

        for (key, value) in source.properties.published()? {
            let key = format!("{}.{}", namespace, key);

            if let Some(owner) = owners.get(&key) {
                match policy {
                    CollisionPolicy::Reject => {
                        return Err(FlowmapError::Collision {
                            key,
                            sources: vec![owner.to_string(), source.id.clone()],
                        });
                    }
                    CollisionPolicy::FirstWriteWins => {
                        trace!(key = %key, kept = *owner, dropped = %source.id, "key already published");
                        continue;
                    }
                    CollisionPolicy::LastWriteWins | CollisionPolicy::NamespaceByNode => {
                        warn!(key = %key, replaced = *owner, by = %source.id, "key published twice, later source wins");
                    }
                }
            }

            owners.insert(key.clone(), source.id.as_str());
            data.insert(key, value);
        }
    }

    Ok(data)
}
