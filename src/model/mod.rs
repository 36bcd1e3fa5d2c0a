mod edge;
mod node;
mod workflow;

pub use edge::EdgeModel;
pub use node::{FALLBACK_POSITION, NodeModel, Position};
pub use workflow::{DOCUMENT_VERSION, Metadata, WorkflowModel};
