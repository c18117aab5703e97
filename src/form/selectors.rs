//! Options for the selector properties, scanned from the workflow graph.

use super::coerce::{read_array, read_string};
use super::records::{SubmissionPrompt, Variable, VariableType};
use crate::graph::{FlowNode, WorkflowGraph};
use crate::registry::{NodeTypeRegistry, ProvidedOutput};
use itertools::Itertools;
use serde::Serialize;

/// One choice offered by a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorOption {
    /// The identifier stored in the draft when selected.
    pub id: String,
    pub label: String,
    /// The node that provides this output.
    pub source_node: String,
}

/// Everything the selectors of one form can offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOptions {
    pub prompts: Vec<SelectorOption>,
    pub list_variables: Vec<SelectorOption>,
}

impl GraphOptions {
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty() && self.list_variables.is_empty()
    }
}

/// Nodes whose outputs are visible from `node_id`: container siblings,
/// upstream nodes, enclosing containers, and nodes with global outputs.
fn visible_nodes<'g>(
    registry: &NodeTypeRegistry,
    graph: &'g WorkflowGraph,
    node_id: &str,
) -> Vec<&'g FlowNode> {
    let mut ancestors = Vec::new();
    let mut current = graph.container_of(node_id);
    while let Some(container) = current {
        if ancestors.iter().any(|a: &&FlowNode| a.id == container.id) {
            break;
        }
        ancestors.push(container);
        current = graph.container_of(&container.id);
    }

    let global = graph.nodes.iter().filter(|n| {
        registry
            .definition(&n.node_type)
            .is_ok_and(|definition| definition.global_outputs)
    });

    graph
        .siblings(node_id)
        .into_iter()
        .chain(graph.upstream(node_id))
        .chain(ancestors)
        .chain(global)
        .filter(|n| n.id != node_id)
        .unique_by(|n| n.id.clone())
        .collect()
}

fn prompt_options(node: &FlowNode, key: &str) -> Vec<SelectorOption> {
    let context = format!("{}.{}", node.id, key);
    let stored = node.data.get(key).map(|v| read_array(v, &context)).unwrap_or_default();
    stored
        .iter()
        .map(SubmissionPrompt::from_value)
        .enumerate()
        .map(|(index, prompt)| {
            let id = if prompt.id.is_empty() {
                format!("{}#{}", node.id, index)
            } else {
                prompt.id.clone()
            };
            let label = if prompt.text.trim().is_empty() {
                format!("Prompt {}", index + 1)
            } else {
                prompt.text
            };
            SelectorOption {
                id,
                label,
                source_node: node.id.clone(),
            }
        })
        .collect()
}

fn list_variable_options(node: &FlowNode, key: &str) -> Vec<SelectorOption> {
    let context = format!("{}.{}", node.id, key);
    let stored = node.data.get(key).map(|v| read_array(v, &context)).unwrap_or_default();
    stored
        .iter()
        .map(Variable::from_value)
        .filter(|v| v.variable_type == VariableType::List && !v.name.trim().is_empty())
        .map(|v| SelectorOption {
            id: v.name.clone(),
            label: v.name,
            source_node: node.id.clone(),
        })
        .collect()
}

fn named_list_variable(node: &FlowNode, name_key: &str) -> Option<SelectorOption> {
    let name = node
        .data
        .get(name_key)
        .map(|v| read_string(v, name_key))
        .filter(|name| !name.trim().is_empty())?;
    Some(SelectorOption {
        id: name.clone(),
        label: name,
        source_node: node.id.clone(),
    })
}

/// Collects the prompt and list-variable options visible from `node_id`.
///
/// Nodes of unregistered types are skipped. Options are ordered nearest
/// source first and deduplicated by id.
pub fn collect_options(registry: &NodeTypeRegistry, graph: &WorkflowGraph, node_id: &str) -> GraphOptions {
    let mut options = GraphOptions::default();
    for node in visible_nodes(registry, graph, node_id) {
        let Ok(definition) = registry.definition(&node.node_type) else {
            continue;
        };
        for output in &definition.outputs {
            match output {
                ProvidedOutput::Prompts { key } => options.prompts.extend(prompt_options(node, key)),
                ProvidedOutput::ListVariables { key } => {
                    options.list_variables.extend(list_variable_options(node, key))
                }
                ProvidedOutput::ListVariable { name_key } => {
                    options.list_variables.extend(named_list_variable(node, name_key))
                }
            }
        }
    }
    options.prompts = options.prompts.into_iter().unique_by(|o| o.id.clone()).collect();
    options.list_variables = options
        .list_variables
        .into_iter()
        .unique_by(|o| o.id.clone())
        .collect();
    options
}
