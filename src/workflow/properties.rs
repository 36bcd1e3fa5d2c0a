//! Kind-specific node properties.
//!
//! Each node kind carries its own property schema. Keys the schema does not
//! know about are kept in `extra` so that a document survives an
//! import/export round trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    FlowmapError, Result,
    mapping::{HeaderVariable, VariableMapping, publish_variables},
    workflow::node::NodeKind,
};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpInputProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Header variables offered to downstream mappers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderVariable>,
    /// Example request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_body: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataMapperProperties {
    /// Raw text of the sample document the mappings were derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_input: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<VariableMapping>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataMapperProperties {
    pub fn valid_mapping_count(&self) -> usize {
        self.mappings.iter().filter(|m| m.is_valid).count()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDesignerProperties {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptProcessorProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Properties of a node, one variant per [`NodeKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeProperties {
    HttpInput(HttpInputProperties),
    DataMapper(DataMapperProperties),
    LayoutDesigner(LayoutDesignerProperties),
    ScriptProcessor(ScriptProcessorProperties),
}

impl NodeProperties {
    /// Empty properties for `kind`.
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::HttpInput => NodeProperties::HttpInput(Default::default()),
            NodeKind::DataMapper => NodeProperties::DataMapper(Default::default()),
            NodeKind::LayoutDesigner => NodeProperties::LayoutDesigner(Default::default()),
            NodeKind::ScriptProcessor => NodeProperties::ScriptProcessor(Default::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeProperties::HttpInput(_) => NodeKind::HttpInput,
            NodeProperties::DataMapper(_) => NodeKind::DataMapper,
            NodeProperties::LayoutDesigner(_) => NodeKind::LayoutDesigner,
            NodeProperties::ScriptProcessor(_) => NodeKind::ScriptProcessor,
        }
    }

    /// Reads the persisted properties object of a node of `kind`.
    pub fn from_map(
        kind: NodeKind,
        properties: Map<String, Value>,
    ) -> Result<Self> {
        let value = Value::Object(properties);
        let invalid = |e: serde_json::Error| FlowmapError::Convert(format!("invalid {} properties: {}", kind.as_ref(), e));

        Ok(match kind {
            NodeKind::HttpInput => NodeProperties::HttpInput(serde_json::from_value(value).map_err(invalid)?),
            NodeKind::DataMapper => NodeProperties::DataMapper(serde_json::from_value(value).map_err(invalid)?),
            NodeKind::LayoutDesigner => NodeProperties::LayoutDesigner(serde_json::from_value(value).map_err(invalid)?),
            NodeKind::ScriptProcessor => NodeProperties::ScriptProcessor(serde_json::from_value(value).map_err(invalid)?),
        })
    }

    /// Persisted properties object.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        let value = match self {
            NodeProperties::HttpInput(p) => serde_json::to_value(p)?,
            NodeProperties::DataMapper(p) => serde_json::to_value(p)?,
            NodeProperties::LayoutDesigner(p) => serde_json::to_value(p)?,
            NodeProperties::ScriptProcessor(p) => serde_json::to_value(p)?,
        };
        match value {
            Value::Object(map) => Ok(map),
            other => Err(FlowmapError::Convert(format!("properties serialized to non-object: {}", other))),
        }
    }

    /// What the node makes visible to downstream nodes.
    ///
    /// Data mappers publish their output variables; every other kind
    /// publishes its raw properties.
    pub fn published(&self) -> Result<Map<String, Value>> {
        match self {
            NodeProperties::DataMapper(p) => {
                let published = publish_variables(&p.mappings);
                let mut map = Map::new();
                for (name, variable) in published.variables {
                    map.insert(name, serde_json::to_value(variable)?);
                }
                Ok(map)
            }
            _ => self.to_map(),
        }
    }

    pub fn as_http_input(&self) -> Option<&HttpInputProperties> {
        match self {
            NodeProperties::HttpInput(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_data_mapper(&self) -> Option<&DataMapperProperties> {
        match self {
            NodeProperties::DataMapper(p) => Some(p),
            _ => None,
        }
    }
}

/// Splits a persisted properties object for parsing.
///
/// Returns the object without `null` entries, and every top-level entry
/// holding `null` or `[]`. The typed schemas omit such values when writing,
/// so they are put back by [`restore_empty`].
pub(crate) fn split_empty(properties: &Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut parsed = Map::new();
    let mut retained = Map::new();
    for (key, value) in properties {
        match value {
            Value::Null => {
                retained.insert(key.clone(), Value::Null);
            }
            Value::Array(items) if items.is_empty() => {
                retained.insert(key.clone(), value.clone());
                parsed.insert(key.clone(), value.clone());
            }
            _ => {
                parsed.insert(key.clone(), value.clone());
            }
        }
    }
    (parsed, retained)
}

/// Writes back retained empty entries the typed properties did not produce.
pub(crate) fn restore_empty(
    properties: &mut Map<String, Value>,
    retained: &Map<String, Value>,
) {
    for (key, value) in retained {
        if !properties.contains_key(key) {
            properties.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::mapping::derive_mappings;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_round_trip_keeps_unknown_keys() {
        let raw = object(json!({
            "method": "POST",
            "headers": [{"name": "x-token", "defaultValue": "t"}],
            "label": "Orders API",
            "retries": 3
        }));
        let props = NodeProperties::from_map(NodeKind::HttpInput, raw.clone()).unwrap();
        let http = props.as_http_input().unwrap();
        assert_eq!(http.method.as_deref(), Some("POST"));
        assert_eq!(http.headers[0].name, "x-token");
        assert_eq!(http.extra["label"], json!("Orders API"));

        assert_eq!(props.to_map().unwrap(), raw);
    }

    #[test]
    fn test_empty_properties_serialize_empty() {
        for kind in [NodeKind::HttpInput, NodeKind::DataMapper, NodeKind::LayoutDesigner, NodeKind::ScriptProcessor] {
            let props = NodeProperties::empty(kind);
            assert_eq!(props.kind(), kind);
            assert!(props.to_map().unwrap().is_empty());
        }
    }

    #[test]
    fn test_split_and_restore_empty() {
        let raw = object(json!({"headers": [], "sampleBody": null, "method": "GET", "tags": []}));
        let (parsed, retained) = split_empty(&raw);
        assert_eq!(Value::Object(parsed.clone()), json!({"headers": [], "method": "GET", "tags": []}));
        assert_eq!(Value::Object(retained.clone()), json!({"headers": [], "sampleBody": null, "tags": []}));

        let mut written = NodeProperties::from_map(NodeKind::HttpInput, parsed).unwrap().to_map().unwrap();
        restore_empty(&mut written, &retained);
        assert_eq!(written, raw);
    }

    #[test]
    fn test_invalid_properties() {
        let err = NodeProperties::from_map(NodeKind::DataMapper, object(json!({"mappings": "nope"}))).unwrap_err();
        assert!(matches!(err, FlowmapError::Convert(_)));
    }

    #[test]
    fn test_published_by_kind() {
        let mapper = NodeProperties::DataMapper(DataMapperProperties {
            json_input: Some(r#"{"id": 1}"#.to_string()),
            mappings: derive_mappings(&json!({"id": 1}), &[]).unwrap(),
            extra: Map::new(),
        });
        let published = mapper.published().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published["id"]["type"], json!("number"));

        let script = NodeProperties::from_map(NodeKind::ScriptProcessor, object(json!({"script": "return 1", "foo": 1}))).unwrap();
        assert_eq!(Value::Object(script.published().unwrap()), json!({"script": "return 1", "foo": 1}));
    }
}
