mod edge;
mod health;
mod node;
mod order;
mod properties;
mod resolver;
mod validator;
mod workflow;

pub use edge::{Edge, EdgeId};
pub use health::{HealthIssue, HealthReport, HealthWeights, IssueSeverity, analyze_health};
pub use node::{Node, NodeId, NodeKind};
pub use order::execution_order;
pub use properties::{DataMapperProperties, HttpInputProperties, LayoutDesignerProperties, NodeProperties, ScriptProcessorProperties};
pub use resolver::{CollisionPolicy, resolve_available_data};
pub use validator::{ValidationReport, validate_workflow};
pub use workflow::Workflow;

use crate::model::{EdgeModel, NodeModel};

/// Anything that can stand for a node in the graph algorithms.
pub trait GraphNode {
    fn node_id(&self) -> &str;
}

/// Anything that can stand for a directed edge in the graph algorithms.
pub trait GraphEdge {
    fn source_id(&self) -> &str;
    fn target_id(&self) -> &str;
}

impl GraphNode for Node {
    fn node_id(&self) -> &str {
        &self.id
    }
}

impl GraphNode for NodeModel {
    fn node_id(&self) -> &str {
        &self.id
    }
}

impl GraphNode for &str {
    fn node_id(&self) -> &str {
        self
    }
}

impl GraphEdge for Edge {
    fn source_id(&self) -> &str {
        &self.source
    }

    fn target_id(&self) -> &str {
        &self.target
    }
}

impl GraphEdge for EdgeModel {
    fn source_id(&self) -> &str {
        &self.source
    }

    fn target_id(&self) -> &str {
        &self.target
    }
}

impl GraphEdge for (&str, &str) {
    fn source_id(&self) -> &str {
        self.0
    }

    fn target_id(&self) -> &str {
        self.1
    }
}
