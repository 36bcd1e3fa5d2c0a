//! Workflow graph snapshot.
//!
//! A [`Workflow`] is an immutable snapshot of nodes and edges. Every editing
//! operation takes `&self` and returns a new snapshot, so callers can hold
//! on to earlier versions (undo, concurrent readers) without locking.

use std::collections::HashMap;

use petgraph::{Direction, graph::DiGraph};
use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    FlowmapError, Result,
    mapping::HeaderVariable,
    model::{EdgeModel, Metadata, NodeModel, WorkflowModel},
    utils,
    workflow::{CollisionPolicy, Edge, Node, NodeId, NodeProperties, ValidationReport, execution_order, resolve_available_data, validate_workflow},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workflow {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Workflow {
    /// create an empty workflow
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// get node by id
    pub fn get_node(
        &self,
        id: &str,
    ) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// get edge by id
    pub fn get_edge(
        &self,
        id: &str,
    ) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// add node to workflow
    pub fn add_node(
        &self,
        node: Node,
    ) -> Result<Self> {
        if self.get_node(&node.id).is_some() {
            return Err(FlowmapError::DuplicateNode(node.id));
        }
        let kind = node.kind();
        trace!(node = %node.id, kind = kind.as_ref(), "add node");

        let mut next = self.clone();
        next.nodes.push(node);
        Ok(next)
    }

    /// remove node and every edge touching it
    pub fn remove_node(
        &self,
        id: &str,
    ) -> Result<Self> {
        if self.get_node(id).is_none() {
            return Err(FlowmapError::NodeNotFound(id.to_string()));
        }
        trace!(node = id, "remove node");

        Ok(Self {
            nodes: self.nodes.iter().filter(|n| n.id != id).cloned().collect(),
            edges: self.edges.iter().filter(|e| !e.touches(id)).cloned().collect(),
        })
    }

    /// add edge between two existing nodes
    pub fn add_edge(
        &self,
        edge: Edge,
    ) -> Result<Self> {
        if edge.source == edge.target {
            return Err(FlowmapError::SelfLoop(edge.source));
        }
        for end in [&edge.source, &edge.target] {
            if self.get_node(end).is_none() {
                return Err(FlowmapError::NodeNotFound(end.clone()));
            }
        }
        if self.edges.iter().any(|e| e.source == edge.source && e.target == edge.target) {
            return Err(FlowmapError::DuplicateEdge {
                from: edge.source,
                to: edge.target,
            });
        }
        if self.get_edge(&edge.id).is_some() {
            return Err(FlowmapError::Structural {
                message: "duplicate edge ids".to_string(),
                ids: vec![edge.id],
            });
        }
        trace!(edge = %edge.id, source = %edge.source, target = %edge.target, "add edge");

        let mut next = self.clone();
        next.edges.push(edge);
        Ok(next)
    }

    /// connect two nodes with a generated edge id
    pub fn connect(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Self> {
        self.add_edge(Edge::connect(source, target))
    }

    /// remove edge by id
    pub fn remove_edge(
        &self,
        id: &str,
    ) -> Result<Self> {
        if self.get_edge(id).is_none() {
            return Err(FlowmapError::EdgeNotFound(id.to_string()));
        }

        let mut next = self.clone();
        next.edges.retain(|e| e.id != id);
        Ok(next)
    }

    /// replace the properties of a node; the kind cannot change
    pub fn update_properties(
        &self,
        id: &str,
        properties: NodeProperties,
    ) -> Result<Self> {
        let node = self.get_node(id).ok_or_else(|| FlowmapError::NodeNotFound(id.to_string()))?;
        if node.kind() != properties.kind() {
            return Err(FlowmapError::KindMismatch {
                node: id.to_string(),
                expected: node.kind().as_ref().to_string(),
                found: properties.kind().as_ref().to_string(),
            });
        }

        let mut next = self.clone();
        if let Some(node) = next.nodes.iter_mut().find(|n| n.id == id) {
            node.properties = properties;
        }
        Ok(next)
    }

    /// direct predecessors of a node, in edge order
    pub fn upstream(
        &self,
        id: &str,
    ) -> Vec<&Node> {
        self.edges.iter().filter(|e| e.target == id).filter_map(|e| self.get_node(&e.source)).collect()
    }

    /// direct successors of a node, in edge order
    pub fn downstream(
        &self,
        id: &str,
    ) -> Vec<&Node> {
        self.edges.iter().filter(|e| e.source == id).filter_map(|e| self.get_node(&e.target)).collect()
    }

    /// header variables declared by the http-input nodes feeding `id`
    pub fn upstream_headers(
        &self,
        id: &str,
    ) -> Vec<HeaderVariable> {
        self.upstream(id).into_iter().filter_map(|n| n.properties.as_http_input()).flat_map(|p| p.headers.iter().cloned()).collect()
    }

    pub fn execution_order(&self) -> Result<Vec<NodeId>> {
        execution_order(&self.nodes, &self.edges)
    }

    pub fn available_data(
        &self,
        id: &str,
        policy: CollisionPolicy,
    ) -> Result<Map<String, Value>> {
        resolve_available_data(id, &self.nodes, &self.edges, policy)
    }

    pub fn validate(&self) -> Result<ValidationReport> {
        let nodes = self.nodes.iter().map(Node::to_model).collect::<Result<Vec<NodeModel>>>()?;
        let edges: Vec<EdgeModel> = self.edges.iter().map(EdgeModel::from).collect();
        Ok(validate_workflow(&nodes, &edges))
    }

    /// Builds a petgraph view of the snapshot for neighbour queries.
    pub(crate) fn graph(&self) -> DiGraph<&Node, &Edge> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index = HashMap::with_capacity(self.nodes.len());

        for node in self.nodes.iter() {
            index.insert(node.id.as_str(), graph.add_node(node));
        }
        for edge in self.edges.iter() {
            if let (Some(&source), Some(&target)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
                graph.add_edge(source, target, edge);
            }
        }
        graph
    }

    /// Exports the persisted document with fresh metadata.
    pub fn export(&self) -> Result<WorkflowModel> {
        let now = utils::time::now_rfc3339();
        let nodes = self.nodes.iter().map(Node::to_model).collect::<Result<Vec<NodeModel>>>()?;

        Ok(WorkflowModel {
            metadata: Some(Metadata {
                version: crate::model::DOCUMENT_VERSION.to_string(),
                created_at: Some(now.clone()),
                imported_at: None,
                total_nodes: nodes.len(),
                total_edges: self.edges.len(),
            }),
            nodes,
            edges: self.edges.iter().map(EdgeModel::from).collect(),
            timestamp: Some(now),
        })
    }

    /// Output a human-readable representation of the workflow graph
    pub fn schema(&self) -> String {
        let graph = self.graph();
        let mut lines = Vec::new();

        lines.push("=== Workflow Graph ===".to_string());
        lines.push(format!("Nodes: {}, Edges: {}", graph.node_count(), graph.edge_count()));
        lines.push(String::new());

        lines.push("--- Nodes ---".to_string());
        for node in self.nodes.iter() {
            lines.push(format!("[{}] (type: {})", node.id, node.kind().as_ref()));
        }
        lines.push(String::new());

        lines.push("--- Edges ---".to_string());
        for edge in self.edges.iter() {
            lines.push(format!("{} --> {} (id: {})", edge.source, edge.target, edge.id));
        }
        lines.push(String::new());

        lines.push("--- Graph Structure ---".to_string());
        for idx in graph.node_indices() {
            let mut outgoing: Vec<&str> = graph.neighbors_directed(idx, Direction::Outgoing).map(|n| graph[n].id.as_str()).collect();
            // petgraph yields neighbours newest first
            outgoing.reverse();

            if outgoing.is_empty() {
                lines.push(format!("{} -> (end)", graph[idx].id));
            } else {
                lines.push(format!("{} -> {}", graph[idx].id, outgoing.join(", ")));
            }
        }
        lines.push(String::new());

        lines.push("--- Execution Order ---".to_string());
        match self.execution_order() {
            Ok(order) => lines.push(order.join(" -> ")),
            Err(e) => lines.push(format!("unavailable: {}", e)),
        }

        lines.join("\n")
    }
}

impl TryFrom<&WorkflowModel> for Workflow {
    type Error = FlowmapError;

    /// Converts a persisted document, rejecting it on structural errors.
    ///
    /// Cycles are accepted: a workflow may be cyclic while it is being edited.
    fn try_from(model: &WorkflowModel) -> Result<Self> {
        let report = validate_workflow(&model.nodes, &model.edges);
        let structural = report.structural_errors();
        if !structural.is_empty() {
            return Err(FlowmapError::Structural {
                message: structural
                    .iter()
                    .map(|e| match e {
                        FlowmapError::Structural {
                            message,
                            ..
                        } => message.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
                ids: structural.iter().flat_map(|e| e.ids()).collect(),
            });
        }

        let nodes = model.nodes.iter().map(Node::try_from).collect::<Result<Vec<Node>>>()?;
        let edges = model.edges.iter().map(Edge::from).collect();
        Ok(Self {
            nodes,
            edges,
        })
    }
}
