use crate::data::DataBag;
use crate::schema::HandleDirection;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub mod conversion;

pub use conversion::IntoWorkflow;

/// Canvas position of a node. Carried through load/save untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A node on the workflow canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub data: DataBag,
    /// The container (page or behaviour) this node sits in.
    #[serde(default, alias = "parentNode", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub position: Position,
}

impl FlowNode {
    pub fn new(id: &str, node_type: &str, data: DataBag) -> Self {
        Self {
            id: id.to_string(),
            node_type: node_type.to_string(),
            data,
            parent_id: None,
            position: Position::default(),
        }
    }

    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }
}

/// An edge between two node handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    #[serde(default, alias = "source_handle")]
    pub source_handle: String,
    pub target: String,
    #[serde(default, alias = "target_handle")]
    pub target_handle: String,
}

impl FlowEdge {
    pub fn new(source: &str, source_handle: &str, target: &str, target_handle: &str) -> Self {
        Self {
            id: format!("{}-{}-{}-{}", source, source_handle, target, target_handle),
            source: source.to_string(),
            source_handle: source_handle.to_string(),
            target: target.to_string(),
            target_handle: target_handle.to_string(),
        }
    }
}

/// A read-only snapshot of the canvas: nodes and the edges between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Edges leaving `node_id` through `handle`.
    pub fn outgoing<'a>(
        &'a self,
        node_id: &'a str,
        handle: &'a str,
    ) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == node_id && e.source_handle == handle)
    }

    /// Edges entering `node_id` through `handle`.
    pub fn incoming<'a>(
        &'a self,
        node_id: &'a str,
        handle: &'a str,
    ) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.target == node_id && e.target_handle == handle)
    }

    /// Number of edges attached to one handle of a node.
    pub fn handle_degree(&self, node_id: &str, handle: &str, direction: HandleDirection) -> usize {
        match direction {
            HandleDirection::Source => self.outgoing(node_id, handle).count(),
            HandleDirection::Target => self.incoming(node_id, handle).count(),
        }
    }

    /// The container node holding `node_id`, if any.
    pub fn container_of(&self, node_id: &str) -> Option<&FlowNode> {
        self.node(node_id)
            .and_then(|n| n.parent_id.as_deref())
            .and_then(|parent| self.node(parent))
    }

    /// Nodes placed directly inside `container_id`.
    pub fn children<'a>(&'a self, container_id: &'a str) -> impl Iterator<Item = &'a FlowNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(container_id))
    }

    /// Other nodes sharing `node_id`'s container. Empty for top-level nodes.
    pub fn siblings(&self, node_id: &str) -> Vec<&FlowNode> {
        let Some(parent) = self.node(node_id).and_then(|n| n.parent_id.as_deref()) else {
            return Vec::new();
        };
        self.children(parent).filter(|n| n.id != node_id).collect()
    }

    /// All nodes that can reach `node_id` by following edges forward,
    /// nearest first.
    pub fn upstream(&self, node_id: &str) -> Vec<&FlowNode> {
        let mut visited: AHashSet<&str> = AHashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut found = Vec::new();

        visited.insert(node_id);
        queue.push_back(node_id);
        while let Some(current) = queue.pop_front() {
            for edge in self.edges.iter().filter(|e| e.target == current) {
                if visited.insert(edge.source.as_str()) {
                    if let Some(node) = self.node(&edge.source) {
                        found.push(node);
                    }
                    queue.push_back(edge.source.as_str());
                }
            }
        }
        found
    }

    /// Replaces a node's data bag wholesale. Returns `false` if the node is gone.
    pub fn replace_node_data(&mut self, node_id: &str, data: DataBag) -> bool {
        match self.node_mut(node_id) {
            Some(node) => {
                node.data = data;
                true
            }
            None => false,
        }
    }
}
