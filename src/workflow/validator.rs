//! Workflow validation.
//!
//! Runs over the persisted document so that nodes of unknown kinds can be
//! reported instead of failing to parse. Errors block saving and executing,
//! warnings are only surfaced.

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    FlowmapError, ValidationWarning,
    model::{EdgeModel, NodeModel},
    workflow::{NodeKind, execution_order},
};

/// Errors and warnings of one validation run, kept strictly apart.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<FlowmapError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// No blocking errors were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors other than cycles, i.e. those that make the document unusable.
    pub fn structural_errors(&self) -> Vec<&FlowmapError> {
        self.errors.iter().filter(|e| !matches!(e, FlowmapError::Cycle { .. })).collect()
    }

    fn structural(
        &mut self,
        message: &str,
        ids: Vec<String>,
    ) {
        if !ids.is_empty() {
            self.errors.push(FlowmapError::Structural {
                message: message.to_string(),
                ids,
            });
        }
    }
}

/// Validates a workflow document.
///
/// Checks, in order: node ids and kinds, edge endpoints, duplicate ids,
/// isolated nodes (warning unless the workflow has a single node) and
/// finally cycles.
pub fn validate_workflow(
    nodes: &[NodeModel],
    edges: &[EdgeModel],
) -> ValidationReport {
    let mut report = ValidationReport::default();

    // 1. node ids and kinds
    let anonymous: Vec<String> = nodes.iter().enumerate().filter(|(_, n)| n.id.is_empty()).map(|(i, _)| format!("#{}", i)).collect();
    report.structural("nodes without id", anonymous);

    let unknown: Vec<String> = nodes.iter().filter(|n| !n.id.is_empty() && NodeKind::from_str(&n.kind).is_err()).map(|n| n.id.clone()).collect();
    report.structural("nodes with unrecognized kind", unknown);

    // 2. edge endpoints
    let node_ids: HashSet<&str> = nodes.iter().filter(|n| !n.id.is_empty()).map(|n| n.id.as_str()).collect();

    let anonymous: Vec<String> = edges.iter().enumerate().filter(|(_, e)| e.id.is_empty()).map(|(i, e)| edge_label(i, e)).collect();
    report.structural("edges without id", anonymous);

    let dangling: Vec<String> = edges
        .iter()
        .enumerate()
        .filter(|(_, e)| !node_ids.contains(e.source.as_str()) || !node_ids.contains(e.target.as_str()))
        .map(|(i, e)| edge_label(i, e))
        .collect();
    report.structural("edges referencing unknown nodes", dangling);

    let self_loops: Vec<String> = edges.iter().enumerate().filter(|(_, e)| e.source == e.target).map(|(i, e)| edge_label(i, e)).collect();
    report.structural("edges connecting a node to itself", self_loops);

    let mut pairs = HashSet::new();
    let repeated: Vec<String> =
        edges.iter().enumerate().filter(|(_, e)| !pairs.insert((e.source.as_str(), e.target.as_str()))).map(|(i, e)| edge_label(i, e)).collect();
    report.structural("edges repeating an existing connection", repeated);

    // 3. duplicate ids
    report.structural("duplicate node ids", duplicates(nodes.iter().map(|n| n.id.as_str())));
    report.structural("duplicate edge ids", duplicates(edges.iter().map(|e| e.id.as_str())));

    // 4. isolated nodes
    if nodes.len() != 1 {
        let connected: HashSet<&str> = edges.iter().flat_map(|e| [e.source.as_str(), e.target.as_str()]).collect();
        for node in nodes.iter().filter(|n| !n.id.is_empty() && !connected.contains(n.id.as_str())) {
            report.warnings.push(ValidationWarning::IsolatedNode {
                node_id: node.id.clone(),
            });
        }
    }

    for node in nodes.iter().filter(|n| n.kind == NodeKind::DataMapper.as_ref() && !n.properties.contains_key("jsonInput")) {
        report.warnings.push(ValidationWarning::MissingField {
            node_id: node.id.clone(),
            field: "jsonInput".to_string(),
        });
    }

    // 5. cycles
    if let Err(err) = execution_order(nodes, edges) {
        report.errors.push(err);
    }

    report
}

/// The edge id, or `#<index>` for an edge without one.
fn edge_label(
    index: usize,
    edge: &EdgeModel,
) -> String {
    if edge.id.is_empty() { format!("#{}", index) } else { edge.id.clone() }
}

/// Non-empty ids occurring more than once, in order of first repetition.
fn duplicates<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut repeated = Vec::new();
    for id in ids.filter(|id| !id.is_empty()) {
        let count = counts.entry(id).or_default();
        *count += 1;
        if *count == 2 {
            repeated.push(id.to_string());
        }
    }
    repeated
}
