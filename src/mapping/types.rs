//! Variable mapping data types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{mapping::compat::is_compatible, utils::random_id};

/// Declared target type of a variable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DataType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
    Object,
    Date,
}

/// Type inferred from a JSON value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JsonType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl JsonType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }
}

/// Where a mapping's value comes from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SourceKind {
    /// Field of the request body document.
    #[default]
    Body,
    /// Header declared on an upstream http-input node.
    HttpHeader,
    /// Hand-authored by the user, not backed by a path.
    Custom,
}

/// A header variable declared on an http-input node.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(try_from = "HeaderRecord", into = "HeaderRecord")]
pub struct HeaderVariable {
    pub name: String,
    pub default_value: Option<String>,
    pub description: Option<String>,
    /// written back as `key` instead of `name`
    keyed: bool,
}

/// Persisted form of a header. Older documents spell `name` as `key`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeaderRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl TryFrom<HeaderRecord> for HeaderVariable {
    type Error = String;

    fn try_from(record: HeaderRecord) -> std::result::Result<Self, Self::Error> {
        let (name, keyed) = match (record.name, record.key) {
            (Some(name), _) => (name, false),
            (None, Some(key)) => (key, true),
            (None, None) => return Err("header variable has neither `name` nor `key`".to_string()),
        };
        Ok(Self {
            name,
            default_value: record.default_value,
            description: record.description,
            keyed,
        })
    }
}

impl From<HeaderVariable> for HeaderRecord {
    fn from(header: HeaderVariable) -> Self {
        let (name, key) = if header.keyed {
            (None, Some(header.name))
        } else {
            (Some(header.name), None)
        };
        Self {
            name,
            key,
            default_value: header.default_value,
            description: header.description,
        }
    }
}

impl HeaderVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_default(
        mut self,
        value: impl Into<String>,
    ) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// One variable extracted from a JSON document, a header or added by hand.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableMapping {
    /// Unique within one traversal run.
    pub id: String,
    /// Dot/bracket path into the document, empty for the root or custom mappings.
    pub source_path: String,
    pub variable_name: String,
    pub data_type: DataType,
    pub json_type: JsonType,
    pub is_valid: bool,
    /// Sample captured for preview only.
    #[serde(default)]
    pub source_value: Value,
    #[serde(default)]
    pub source_kind: SourceKind,
}

impl VariableMapping {
    /// Creates a hand-authored mapping with an empty path.
    ///
    /// Custom mappings are not backed by a document value, so they are
    /// always considered valid.
    pub fn custom(
        variable_name: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            id: random_id("custom"),
            source_path: String::new(),
            variable_name: variable_name.into(),
            data_type,
            json_type: JsonType::String,
            is_valid: true,
            source_value: Value::Null,
            source_kind: SourceKind::Custom,
        }
    }

    /// Renames the published variable.
    pub fn set_variable_name(
        &mut self,
        name: impl Into<String>,
    ) {
        self.variable_name = name.into();
    }

    /// Changes the declared type and recomputes validity.
    ///
    /// Header and custom mappings keep their forced validity.
    pub fn set_data_type(
        &mut self,
        data_type: DataType,
    ) {
        self.data_type = data_type;
        if self.source_kind == SourceKind::Body {
            self.is_valid = is_compatible(self.json_type, data_type);
        }
    }

    /// Whether this mapping contributes an output variable.
    pub fn is_published(&self) -> bool {
        self.is_valid && !self.variable_name.is_empty()
    }
}

/// Derives the default variable name for a path.
///
/// `[`, `]` and `.` become `_`, leading underscores are stripped:
/// `user.id` -> `user_id`, `tags[0]` -> `tags_0_`.
pub fn default_variable_name(path: &str) -> String {
    let replaced: String = path
        .chars()
        .map(|c| match c {
            '[' | ']' | '.' => '_',
            c => c,
        })
        .collect();
    replaced.trim_start_matches('_').to_string()
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_variable_name() {
        assert_eq!(default_variable_name("user"), "user");
        assert_eq!(default_variable_name("user.id"), "user_id");
        assert_eq!(default_variable_name("tags[0]"), "tags_0_");
        assert_eq!(default_variable_name("[0].name"), "0__name");
        assert_eq!(default_variable_name(""), "");
    }

    #[test]
    fn test_json_type_of() {
        assert_eq!(JsonType::of(&json!(null)), JsonType::Null);
        assert_eq!(JsonType::of(&json!(true)), JsonType::Boolean);
        assert_eq!(JsonType::of(&json!(1.5)), JsonType::Number);
        assert_eq!(JsonType::of(&json!("x")), JsonType::String);
        assert_eq!(JsonType::of(&json!([])), JsonType::Array);
        assert_eq!(JsonType::of(&json!({})), JsonType::Object);
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(SourceKind::HttpHeader.as_ref(), "http-header");
        assert_eq!(DataType::from_str("date").unwrap(), DataType::Date);
        assert_eq!(serde_json::to_value(JsonType::Null).unwrap(), json!("null"));
    }

    #[test]
    fn test_set_data_type_recomputes_validity() {
        let mut mapping = VariableMapping {
            id: "map_1".to_string(),
            source_path: "count".to_string(),
            variable_name: "count".to_string(),
            data_type: DataType::Number,
            json_type: JsonType::Number,
            is_valid: true,
            source_value: json!(3),
            source_kind: SourceKind::Body,
        };
        mapping.set_data_type(DataType::Boolean);
        assert!(!mapping.is_valid);
        mapping.set_data_type(DataType::String);
        assert!(mapping.is_valid);
    }

    #[test]
    fn test_custom_mapping() {
        let mut mapping = VariableMapping::custom("total", DataType::Number);
        assert!(mapping.id.starts_with("custom_"));
        assert!(mapping.source_path.is_empty());
        assert!(mapping.is_published());
        mapping.set_data_type(DataType::Array);
        assert!(mapping.is_valid);
        mapping.set_variable_name("");
        assert!(!mapping.is_published());
    }

    #[test]
    fn test_header_variable_accepts_key_alias() {
        let raw = json!({"key": "x-token", "defaultValue": "abc"});
        let header: HeaderVariable = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(header.name, "x-token");
        assert_eq!(header.default_value.as_deref(), Some("abc"));
        assert_eq!(serde_json::to_value(&header).unwrap(), raw);

        let header = HeaderVariable::new("x-user").with_default("anon");
        assert_eq!(serde_json::to_value(&header).unwrap(), json!({"name": "x-user", "defaultValue": "anon"}));
        assert!(serde_json::from_value::<HeaderVariable>(json!({"description": "nameless"})).is_err());
    }
}
