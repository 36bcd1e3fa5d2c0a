//! Output variable publisher.
//!
//! Turns a mapping list into the node's public variable namespace. Output
//! variables are always recomputed from the mappings, never stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    ValidationWarning,
    mapping::types::{DataType, SourceKind, VariableMapping},
};

/// A published, read-only variable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputVariable {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub path: String,
    pub source_kind: SourceKind,
    pub description: String,
}

impl From<&VariableMapping> for OutputVariable {
    fn from(mapping: &VariableMapping) -> Self {
        let description = match mapping.source_kind {
            SourceKind::Body if mapping.source_path.is_empty() => "Request body".to_string(),
            SourceKind::Body => format!("Body field '{}'", mapping.source_path),
            SourceKind::HttpHeader => format!("Header '{}'", mapping.source_path.trim_start_matches("headers.")),
            SourceKind::Custom => "Custom variable".to_string(),
        };

        Self {
            data_type: mapping.data_type,
            path: mapping.source_path.clone(),
            source_kind: mapping.source_kind,
            description,
        }
    }
}

/// Result of [`publish_variables`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PublishedVariables {
    pub variables: BTreeMap<String, OutputVariable>,
    pub warnings: Vec<ValidationWarning>,
}

/// Publishes every valid, named mapping.
///
/// Duplicate names are reported as warnings and not renamed; the later
/// mapping occupies the name.
pub fn publish_variables(mappings: &[VariableMapping]) -> PublishedVariables {
    let mut variables = BTreeMap::new();
    let mut owners: Vec<(&str, Vec<String>)> = Vec::new();

    for mapping in mappings.iter().filter(|m| m.is_published()) {
        let name = mapping.variable_name.as_str();
        match owners.iter_mut().find(|(n, _)| *n == name) {
            Some((_, ids)) => ids.push(mapping.id.clone()),
            None => owners.push((name, vec![mapping.id.clone()])),
        }
        variables.insert(name.to_string(), OutputVariable::from(mapping));
    }

    let warnings = owners
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(name, mapping_ids)| {
            warn!(name, count = mapping_ids.len(), "duplicate variable name");
            ValidationWarning::DuplicateVariableName {
                name: name.to_string(),
                mapping_ids,
            }
        })
        .collect();

    PublishedVariables {
        variables,
        warnings,
    }
}
