use crate::error::WorkflowConversionError;
use crate::graph::{FlowEdge, FlowNode, IntoWorkflow, WorkflowGraph};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;

/// A workflow as the editor persists it: canvas nodes, edges and viewport.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Value>,
}

impl WorkflowDocument {
    /// Load a workflow document from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let document = Self::from_json(&content)?;
        Ok(document)
    }

    pub fn from_json(json: &str) -> Result<Self, WorkflowConversionError> {
        serde_json::from_str(json).map_err(|e| WorkflowConversionError::JsonParseError(e.to_string()))
    }

    /// Writes the document back as pretty JSON.
    pub fn save(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Rebuilds a document from an edited graph, keeping this document's viewport.
    pub fn with_graph(&self, graph: WorkflowGraph) -> Self {
        Self {
            nodes: graph.nodes,
            edges: graph.edges,
            viewport: self.viewport.clone(),
        }
    }
}

impl IntoWorkflow for WorkflowDocument {
    fn into_workflow(self) -> Result<WorkflowGraph, WorkflowConversionError> {
        let mut seen = AHashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(WorkflowConversionError::ValidationError(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(WorkflowConversionError::ValidationError(format!(
                        "edge '{}' references missing node '{}'",
                        edge.id, endpoint
                    )));
                }
            }
        }
        Ok(WorkflowGraph::new(self.nodes, self.edges))
    }
}
