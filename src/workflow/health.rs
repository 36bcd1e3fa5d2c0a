//! Health scoring.
//!
//! A heuristic 0-100 signal for the editor. It is deliberately separate from
//! [`validate_workflow`](crate::validate_workflow): nothing here is allowed
//! to block saving or executing a workflow.

use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    mapping::publish_variables,
    workflow::{NodeId, NodeKind, Workflow},
};

const MAX_SCORE: i32 = 100;

/// Score deltas applied per detected condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthWeights {
    /// penalty per node without any edge
    pub orphan_node: i32,
    /// penalty per http-input without a downstream data-mapper
    pub unmapped_input: i32,
    /// penalty per data-mapper without a valid mapping
    pub empty_mapper: i32,
    /// bonus per complete input -> mapper -> output chain
    pub complete_chain: i32,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            orphan_node: 10,
            unmapped_input: 15,
            empty_mapper: 20,
            complete_chain: 5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthIssue {
    pub severity: IssueSeverity,
    pub node_id: NodeId,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub score: u8,
    pub issues: Vec<HealthIssue>,
    pub complete_chains: usize,
}

/// Scores `workflow` starting from 100.
pub fn analyze_health(
    workflow: &Workflow,
    weights: &HealthWeights,
) -> HealthReport {
    let graph = workflow.graph();
    let mut score = MAX_SCORE;
    let mut issues = Vec::new();
    let mut complete_chains = 0;

    for idx in graph.node_indices() {
        let node = graph[idx];

        if graph.node_count() > 1 && graph.neighbors_undirected(idx).next().is_none() {
            score = score.saturating_sub(weights.orphan_node);
            issues.push(HealthIssue {
                severity: IssueSeverity::Warning,
                node_id: node.id.clone(),
                message: "node is not connected to the workflow".to_string(),
            });
        }

        match node.kind() {
            NodeKind::HttpInput => {
                let mappers: Vec<_> = graph.neighbors_directed(idx, Direction::Outgoing).filter(|n| graph[*n].kind() == NodeKind::DataMapper).collect();
                if mappers.is_empty() {
                    score = score.saturating_sub(weights.unmapped_input);
                    issues.push(HealthIssue {
                        severity: IssueSeverity::Warning,
                        node_id: node.id.clone(),
                        message: "http input is not mapped by any data mapper".to_string(),
                    });
                }

                for mapper_idx in mappers {
                    complete_chains += graph
                        .neighbors_directed(mapper_idx, Direction::Outgoing)
                        .filter(|n| matches!(graph[*n].kind(), NodeKind::LayoutDesigner | NodeKind::ScriptProcessor))
                        .count();
                }
            }
            NodeKind::DataMapper => {
                let Some(props) = node.properties.as_data_mapper() else {
                    continue;
                };
                if props.valid_mapping_count() == 0 {
                    score = score.saturating_sub(weights.empty_mapper);
                    issues.push(HealthIssue {
                        severity: IssueSeverity::Critical,
                        node_id: node.id.clone(),
                        message: "data mapper has no valid mappings".to_string(),
                    });
                }
                for warning in publish_variables(&props.mappings).warnings {
                    issues.push(HealthIssue {
                        severity: IssueSeverity::Info,
                        node_id: node.id.clone(),
                        message: warning.to_string(),
                    });
                }
            }
            NodeKind::LayoutDesigner | NodeKind::ScriptProcessor => {}
        }
    }

    let chains = i32::try_from(complete_chains).unwrap_or(i32::MAX);
    score = score.saturating_add(weights.complete_chain.saturating_mul(chains));
    let score = score.clamp(0, MAX_SCORE) as u8;
    debug!(score, issues = issues.len(), complete_chains, "workflow health");

    HealthReport {
        score,
        issues,
        complete_chains,
    }
}
