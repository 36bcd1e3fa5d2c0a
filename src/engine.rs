//! Engine - the main entry point for Flowmap.
//!
//! The engine bundles a [`Config`] with the operations an editor needs:
//! - Importing and exporting workflow documents
//! - Validation, execution order and health scoring
//! - Deriving and refreshing the variable mappings of data-mapper nodes
//! - Resolving the data available to a node from its upstream neighbours
//!
//! It holds no workflow state. Every operation works on the snapshot it is
//! given and returns a new one.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    Config, FlowmapError, Result,
    mapping::{HeaderVariable, MappingEngine, PublishedVariables, VariableMapping, publish_variables},
    model::WorkflowModel,
    workflow::{HealthReport, NodeId, NodeProperties, ValidationReport, Workflow, analyze_health, validate_workflow},
};

/// The workflow engine.
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
///
/// let workflow = engine.import(json_str)?;
/// let workflow = engine.refresh_mappings(&workflow, "mapper", r#"{"id": 1}"#)?;
/// let order = engine.execution_order(&workflow)?;
/// let text = engine.export(&workflow)?;
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    mapper: MappingEngine,
}

impl Engine {
    /// Creates a new engine with the given configuration.
    pub fn new_with_config(config: Config) -> Self {
        let mapper = MappingEngine::new(config.mapping.max_depth);
        Self {
            config,
            mapper,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parses, normalizes and converts a workflow document.
    ///
    /// Fails on structural errors; a cyclic document is still imported.
    pub fn import(
        &self,
        json: &str,
    ) -> Result<Workflow> {
        let model = WorkflowModel::import(json)?;
        let workflow = Workflow::try_from(&model)?;
        info!(nodes = workflow.nodes().len(), edges = workflow.edges().len(), "workflow imported");

        Ok(workflow)
    }

    /// Serializes a workflow with fresh metadata.
    pub fn export(
        &self,
        workflow: &Workflow,
    ) -> Result<String> {
        workflow.export()?.to_json()
    }

    pub fn validate(
        &self,
        model: &WorkflowModel,
    ) -> ValidationReport {
        let report = validate_workflow(&model.nodes, &model.edges);
        if !report.is_valid() {
            warn!(errors = report.errors.len(), "workflow is invalid");
        }
        debug!(warnings = report.warnings.len(), "workflow validated");

        report
    }

    pub fn execution_order(
        &self,
        workflow: &Workflow,
    ) -> Result<Vec<NodeId>> {
        workflow.execution_order()
    }

    /// Data published to `node_id` by its upstream neighbours, merged with
    /// the configured collision policy.
    pub fn available_data(
        &self,
        workflow: &Workflow,
        node_id: &str,
    ) -> Result<Map<String, Value>> {
        if workflow.get_node(node_id).is_none() {
            return Err(FlowmapError::NodeNotFound(node_id.to_string()));
        }
        workflow.available_data(node_id, self.config.resolver.collision_policy)
    }

    pub fn derive_mappings(
        &self,
        text: &str,
        headers: &[HeaderVariable],
    ) -> Result<Vec<VariableMapping>> {
        self.mapper.derive_from_str(text, headers)
    }

    /// Re-derives the mappings of a data-mapper node from a new sample.
    ///
    /// Headers come from the http-input nodes directly upstream. On a parse
    /// error the workflow is left untouched and the error returned.
    pub fn refresh_mappings(
        &self,
        workflow: &Workflow,
        node_id: &str,
        json_text: &str,
    ) -> Result<Workflow> {
        let node = workflow.get_node(node_id).ok_or_else(|| FlowmapError::NodeNotFound(node_id.to_string()))?;
        let Some(current) = node.properties.as_data_mapper() else {
            return Err(FlowmapError::KindMismatch {
                node: node_id.to_string(),
                expected: "data-mapper".to_string(),
                found: node.kind().as_ref().to_string(),
            });
        };

        let headers = workflow.upstream_headers(node_id);
        let mappings = self.mapper.regenerate(&current.mappings, json_text, &headers, self.config.mapping.custom_policy)?;
        debug!(node = node_id, mappings = mappings.len(), headers = headers.len(), "mappings refreshed");

        let mut props = current.clone();
        props.json_input = Some(json_text.to_string());
        props.mappings = mappings;
        workflow.update_properties(node_id, NodeProperties::DataMapper(props))
    }

    pub fn publish(
        &self,
        mappings: &[VariableMapping],
    ) -> PublishedVariables {
        publish_variables(mappings)
    }

    pub fn health(
        &self,
        workflow: &Workflow,
    ) -> HealthReport {
        analyze_health(workflow, &self.config.health)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new_with_config(Config::default())
    }
}
