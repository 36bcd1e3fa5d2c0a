//! JSON mapping engine.
//!
//! Walks a JSON document in pre-order and emits one [`VariableMapping`] per
//! visited value. Arrays are sampled by their first element only. Header
//! variables of upstream http-input nodes are appended after all body
//! mappings.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    FlowmapError, Result,
    mapping::{
        compat::is_compatible,
        types::{DataType, HeaderVariable, JsonType, SourceKind, VariableMapping, default_variable_name},
    },
    utils::IdGenerator,
};

/// Default nesting limit of a document.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Deepest limit text input can honour. serde_json refuses to nest more than
/// 127 containers, the last of which sits at depth 126.
pub const MAX_SUPPORTED_DEPTH: usize = 126;

/// Strings starting with `YYYY-MM-DD` are declared as dates.
const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}";

const RECURSION_LIMIT_MESSAGE: &str = "recursion limit exceeded";

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(DATE_PATTERN).expect("date pattern is valid"));

/// What happens to hand-authored mappings when the document changes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CustomMappingPolicy {
    /// Keep custom mappings, appended after body and header mappings.
    #[default]
    Preserve,
    /// Drop custom mappings with the rest of the old list.
    Discard,
}

/// Derives variable mappings from JSON documents.
#[derive(Debug, Clone)]
pub struct MappingEngine {
    max_depth: usize,
}

impl Default for MappingEngine {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MappingEngine {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Derives the mappings of `document` followed by one mapping per header.
    pub fn derive(
        &self,
        document: &Value,
        headers: &[HeaderVariable],
    ) -> Result<Vec<VariableMapping>> {
        let mut traversal = Traversal {
            ids: IdGenerator::new("map"),
            max_depth: self.max_depth,
            mappings: Vec::new(),
        };
        traversal.visit(document, "", 0)?;
        for header in headers {
            traversal.push_header(header);
        }

        debug!(count = traversal.mappings.len(), headers = headers.len(), "derived variable mappings");
        Ok(traversal.mappings)
    }

    /// Parses `text` and derives its mappings.
    ///
    /// Invalid JSON fails with [`FlowmapError::Parse`] carrying the parser
    /// message. Text nested deeper than the parser accepts fails with
    /// [`FlowmapError::DepthExceeded`] at the position the parser stopped.
    pub fn derive_from_str(
        &self,
        text: &str,
        headers: &[HeaderVariable],
    ) -> Result<Vec<VariableMapping>> {
        let document: Value = serde_json::from_str(text).map_err(|e| self.parse_error(e))?;
        self.derive(&document, headers)
    }

    fn parse_error(
        &self,
        error: serde_json::Error,
    ) -> FlowmapError {
        if error.is_syntax() && error.to_string().starts_with(RECURSION_LIMIT_MESSAGE) {
            debug!(line = error.line(), column = error.column(), "document nested beyond the parser limit");
            return FlowmapError::DepthExceeded {
                max_depth: self.max_depth.min(MAX_SUPPORTED_DEPTH),
                path: format!("line {} column {}", error.line(), error.column()),
            };
        }
        FlowmapError::Parse(error.to_string())
    }

    /// Regenerates a mapping list after the source document changed.
    ///
    /// Body and header mappings are rebuilt from scratch. Custom mappings of
    /// `previous` are kept or dropped according to `policy`. On a parse
    /// error nothing is regenerated and the caller keeps `previous`.
    pub fn regenerate(
        &self,
        previous: &[VariableMapping],
        text: &str,
        headers: &[HeaderVariable],
        policy: CustomMappingPolicy,
    ) -> Result<Vec<VariableMapping>> {
        let mut mappings = self.derive_from_str(text, headers)?;
        if policy == CustomMappingPolicy::Preserve {
            mappings.extend(previous.iter().filter(|m| m.source_kind == SourceKind::Custom).cloned());
        }
        Ok(mappings)
    }
}

/// Derives mappings with the default depth limit.
pub fn derive_mappings(
    document: &Value,
    headers: &[HeaderVariable],
) -> Result<Vec<VariableMapping>> {
    MappingEngine::default().derive(document, headers)
}

/// Parses and derives mappings with the default depth limit.
pub fn derive_mappings_from_str(
    text: &str,
    headers: &[HeaderVariable],
) -> Result<Vec<VariableMapping>> {
    MappingEngine::default().derive_from_str(text, headers)
}

/// Infers the declared type of a scalar value.
fn infer_data_type(value: &Value) -> DataType {
    match value {
        Value::Bool(_) => DataType::Boolean,
        Value::Number(_) => DataType::Number,
        Value::String(s) if DATE_RE.is_match(s) => DataType::Date,
        Value::Array(_) => DataType::Array,
        Value::Object(_) => DataType::Object,
        Value::Null | Value::String(_) => DataType::String,
    }
}

struct Traversal {
    ids: IdGenerator,
    max_depth: usize,
    mappings: Vec<VariableMapping>,
}

impl Traversal {
    fn visit(
        &mut self,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(FlowmapError::DepthExceeded {
                max_depth: self.max_depth,
                path: path.to_string(),
            });
        }

        match value {
            Value::Array(items) => {
                self.push(path, value, Value::String(format!("Array[{}]", items.len())));
                if let Some(first) = items.first() {
                    self.visit(first, &format!("{}[0]", path), depth + 1)?;
                }
            }
            Value::Object(fields) => {
                if !path.is_empty() {
                    self.push(path, value, Value::String("Object".to_string()));
                }
                for (key, field) in fields {
                    let child = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    self.visit(field, &child, depth + 1)?;
                }
            }
            _ => self.push(path, value, value.clone()),
        }
        Ok(())
    }

    fn push(
        &mut self,
        path: &str,
        value: &Value,
        sample: Value,
    ) {
        let json_type = JsonType::of(value);
        let data_type = infer_data_type(value);
        trace!(path, json_type = json_type.as_ref(), data_type = data_type.as_ref(), "mapping");

        self.mappings.push(VariableMapping {
            id: self.ids.next_id(),
            source_path: path.to_string(),
            variable_name: default_variable_name(path),
            data_type,
            json_type,
            is_valid: is_compatible(json_type, data_type),
            source_value: sample,
            source_kind: SourceKind::Body,
        });
    }

    fn push_header(
        &mut self,
        header: &HeaderVariable,
    ) {
        let path = format!("headers.{}", header.name);
        let sample = header.default_value.clone().unwrap_or_else(|| format!("<{}>", header.name));

        self.mappings.push(VariableMapping {
            id: self.ids.next_id(),
            variable_name: default_variable_name(&path),
            source_path: path,
            data_type: DataType::String,
            json_type: JsonType::String,
            is_valid: true,
            source_value: Value::String(sample),
            source_kind: SourceKind::HttpHeader,
        });
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    fn paths(mappings: &[VariableMapping]) -> Vec<&str> {
        mappings.iter().map(|m| m.source_path.as_str()).collect()
    }

    #[test]
    fn test_nested_object() {
        let mappings = derive_mappings(&json!({"user": {"id": 1, "name": "A"}}), &[]).unwrap();

        assert_eq!(paths(&mappings), vec!["user", "user.id", "user.name"]);
        let names: Vec<&str> = mappings.iter().map(|m| m.variable_name.as_str()).collect();
        assert_eq!(names, vec!["user", "user_id", "user_name"]);

        assert_eq!(mappings[0].json_type, JsonType::Object);
        assert_eq!(mappings[0].data_type, DataType::Object);
        assert_eq!(mappings[0].source_value, json!("Object"));
        assert_eq!(mappings[1].json_type, JsonType::Number);
        assert_eq!(mappings[1].source_value, json!(1));
        assert_eq!(mappings[2].data_type, DataType::String);
        assert!(mappings.iter().all(|m| m.is_valid));
    }

    #[test]
    fn test_array_sampled_by_first_element() {
        let mappings = derive_mappings(&json!({"tags": ["a", "b"]}), &[]).unwrap();

        assert_eq!(paths(&mappings), vec!["tags", "tags[0]"]);
        assert_eq!(mappings[0].data_type, DataType::Array);
        assert_eq!(mappings[0].source_value, json!("Array[2]"));
        assert_eq!(mappings[1].data_type, DataType::String);
        assert_eq!(mappings[1].source_value, json!("a"));
        assert_eq!(mappings[1].variable_name, "tags_0_");
    }

    #[test]
    fn test_empty_array_has_no_children() {
        let mappings = derive_mappings(&json!({"items": []}), &[]).unwrap();
        assert_eq!(paths(&mappings), vec!["items"]);
        assert_eq!(mappings[0].source_value, json!("Array[0]"));
    }

    #[test]
    fn test_array_of_objects() {
        let mappings = derive_mappings(&json!({"rows": [{"id": 1}, {"id": 2, "extra": true}]}), &[]).unwrap();
        assert_eq!(paths(&mappings), vec!["rows", "rows[0]", "rows[0].id"]);
        assert_eq!(mappings[1].data_type, DataType::Object);
        assert_eq!(mappings[2].variable_name, "rows_0__id");
    }

    #[test]
    fn test_scalar_inference() {
        let mappings = derive_mappings(
            &json!({
                "missing": null,
                "active": false,
                "born": "2001-02-03T10:00:00Z",
                "label": "2001/02/03",
                "ratio": 0.5
            }),
            &[],
        )
        .unwrap();

        let summary: Vec<(DataType, JsonType)> = mappings.iter().map(|m| (m.data_type, m.json_type)).collect();
        assert_eq!(
            summary,
            vec![
                (DataType::String, JsonType::Null),
                (DataType::Boolean, JsonType::Boolean),
                (DataType::Date, JsonType::String),
                (DataType::String, JsonType::String),
                (DataType::Number, JsonType::Number),
            ]
        );
        assert!(mappings.iter().all(|m| m.is_valid));
    }

    #[test]
    fn test_keys_keep_declaration_order() {
        let mappings = derive_mappings_from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#, &[]).unwrap();
        assert_eq!(paths(&mappings), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_root_array_and_scalar() {
        let mappings = derive_mappings(&json!([{"a": 1}]), &[]).unwrap();
        assert_eq!(paths(&mappings), vec!["", "[0]", "[0].a"]);
        assert_eq!(mappings[0].variable_name, "");
        assert_eq!(mappings[2].variable_name, "0__a");

        let mappings = derive_mappings(&json!(42), &[]).unwrap();
        assert_eq!(paths(&mappings), vec![""]);
        assert_eq!(mappings[0].data_type, DataType::Number);
    }

    #[test]
    fn test_ids_unique_within_run() {
        let mappings = derive_mappings(&json!({"a": {"b": {"c": [1, 2]}}, "d": "x"}), &[HeaderVariable::new("x-id")]).unwrap();
        let ids: HashSet<&str> = mappings.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), mappings.len());
    }

    #[test]
    fn test_headers_appended_last() {
        let headers = vec![HeaderVariable::new("authorization").with_default("Bearer x"), HeaderVariable::new("x-trace")];
        let mappings = derive_mappings(&json!({"id": 7}), &headers).unwrap();

        assert_eq!(paths(&mappings), vec!["id", "headers.authorization", "headers.x-trace"]);
        let auth = &mappings[1];
        assert_eq!(auth.source_kind, SourceKind::HttpHeader);
        assert_eq!(auth.data_type, DataType::String);
        assert!(auth.is_valid);
        assert_eq!(auth.variable_name, "headers_authorization");
        assert_eq!(auth.source_value, json!("Bearer x"));
        assert_eq!(mappings[2].source_value, json!("<x-trace>"));
    }

    #[test]
    fn test_idempotent_ignoring_ids() {
        let text = r#"{"order": {"id": "A-1", "lines": [{"sku": "x", "qty": 2}], "placed": "2024-05-01"}}"#;
        let first = derive_mappings_from_str(text, &[]).unwrap();
        let second = derive_mappings_from_str(text, &[]).unwrap();

        let key = |m: &VariableMapping| (m.source_path.clone(), m.data_type, m.json_type, m.source_value.clone());
        assert_eq!(first.iter().map(key).collect::<Vec<_>>(), second.iter().map(key).collect::<Vec<_>>());
    }

    #[test]
    fn test_parse_error() {
        let err = derive_mappings_from_str("{\"a\": ", &[]).unwrap_err();
        assert!(matches!(err, FlowmapError::Parse(_)));
    }

    #[test]
    fn test_depth_exceeded() {
        let mut document = json!(1);
        for _ in 0..10 {
            document = json!({ "n": document });
        }

        let engine = MappingEngine::new(4);
        let err = engine.derive(&document, &[]).unwrap_err();
        assert_eq!(
            err,
            FlowmapError::DepthExceeded {
                max_depth: 4,
                path: "n.n.n.n.n".to_string(),
            }
        );

        assert!(MappingEngine::new(10).derive(&document, &[]).is_ok());
    }

    fn nested_text(levels: usize) -> String {
        format!("{}1{}", "{\"n\":".repeat(levels), "}".repeat(levels))
    }

    #[test]
    fn test_deep_text_is_depth_error() {
        let err = derive_mappings_from_str(&nested_text(200), &[]).unwrap_err();
        assert!(matches!(err, FlowmapError::DepthExceeded { max_depth: 64, .. }), "{:?}", err);

        let err = MappingEngine::new(500).derive_from_str(&nested_text(200), &[]).unwrap_err();
        assert!(matches!(err, FlowmapError::DepthExceeded { max_depth: MAX_SUPPORTED_DEPTH, .. }), "{:?}", err);

        let err = MappingEngine::new(MAX_SUPPORTED_DEPTH).derive_from_str(&nested_text(127), &[]).unwrap_err();
        assert!(matches!(err, FlowmapError::DepthExceeded { .. }), "{:?}", err);
    }

    #[test]
    fn test_text_at_supported_depth() {
        let mappings = MappingEngine::new(MAX_SUPPORTED_DEPTH).derive_from_str(&nested_text(126), &[]).unwrap();
        assert_eq!(mappings.len(), 126);
        assert_eq!(mappings.last().map(|m| m.source_value.clone()), Some(json!(1)));

        let err = derive_mappings_from_str(&nested_text(100), &[]).unwrap_err();
        assert_eq!(
            err,
            FlowmapError::DepthExceeded {
                max_depth: 64,
                path: vec!["n"; 65].join("."),
            }
        );
    }

    #[test]
    fn test_regenerate_custom_policy() {
        let engine = MappingEngine::default();
        let mut previous = engine.derive_from_str(r#"{"old": 1}"#, &[]).unwrap();
        previous.push(VariableMapping::custom("total", DataType::Number));

        let kept = engine.regenerate(&previous, r#"{"new": true}"#, &[], CustomMappingPolicy::Preserve).unwrap();
        assert_eq!(paths(&kept), vec!["new", ""]);
        assert_eq!(kept[1].variable_name, "total");

        let dropped = engine.regenerate(&previous, r#"{"new": true}"#, &[], CustomMappingPolicy::Discard).unwrap();
        assert_eq!(paths(&dropped), vec!["new"]);

        let err = engine.regenerate(&previous, "not json", &[], CustomMappingPolicy::Preserve).unwrap_err();
        assert!(matches!(err, FlowmapError::Parse(_)));
    }
}
