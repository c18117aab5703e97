use super::WorkflowGraph;
use crate::error::WorkflowConversionError;

/// A trait for stored workflow formats that can be turned into a `WorkflowGraph`.
///
/// This is the extension point for loading canvases exported by other editors.
/// Implement it on your own document structs to translate them into the canonical
/// node/edge model the registry and settings forms work against.
///
/// # Example
///
/// ```rust,no_run
/// use settei::prelude::*;
/// use settei::error::WorkflowConversionError;
/// use std::result::Result;
///
/// struct LegacyStep { id: String, kind: String }
/// struct LegacyWorkflow { steps: Vec<LegacyStep> }
///
/// impl IntoWorkflow for LegacyWorkflow {
///     fn into_workflow(self) -> Result<WorkflowGraph, WorkflowConversionError> {
///         let nodes = self
///             .steps
///             .into_iter()
///             .map(|s| FlowNode::new(&s.id, &s.kind, DataBag::new()))
///             .collect();
///         Ok(WorkflowGraph::new(nodes, vec![]))
///     }
/// }
/// ```
pub trait IntoWorkflow {
    /// Consumes the object and converts it into a workflow graph.
    fn into_workflow(self) -> Result<WorkflowGraph, WorkflowConversionError>;
}

impl IntoWorkflow for WorkflowGraph {
    fn into_workflow(self) -> Result<WorkflowGraph, WorkflowConversionError> {
        Ok(self)
    }
}
