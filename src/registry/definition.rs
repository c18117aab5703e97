use crate::data::DataBag;
use crate::graph::{FlowEdge, FlowNode};
use crate::schema::{HandleCompatibility, NodeSchema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Side-menu grouping of insertable node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Starter,
    Agent,
    Behaviour,
    Content,
    Structure,
}

impl NodeCategory {
    pub fn name(&self) -> &'static str {
        match self {
            NodeCategory::Starter => "Starter",
            NodeCategory::Agent => "Agent",
            NodeCategory::Behaviour => "Behaviour",
            NodeCategory::Content => "Content",
            NodeCategory::Structure => "Structure",
        }
    }
}

/// What the side menu shows for a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuInfo {
    pub name: String,
    pub icon: String,
    pub description: String,
    pub category: NodeCategory,
}

impl MenuInfo {
    pub fn new(name: &str, icon: &str, category: NodeCategory, description: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
            category,
        }
    }
}

/// Outputs a node exposes to selector properties of other nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProvidedOutput {
    /// Every submission prompt record stored under `key`.
    Prompts { key: String },
    /// Every `list`-typed variable record stored under `key`.
    ListVariables { key: String },
    /// A single list variable whose name is the text stored under `name_key`.
    #[serde(rename_all = "camelCase")]
    ListVariable { name_key: String },
}

/// Reports whether a node is correctly wired, given all edges of the workflow.
pub type ValidityCheck = Arc<dyn Fn(&[FlowEdge], &str) -> bool + Send + Sync>;

/// Instantiates a node of a type with the given id.
pub type NodeFactory = Arc<dyn Fn(&NodeSchema, &str) -> FlowNode + Send + Sync>;

/// Builds a validity check that requires at least one edge on each of `handles`.
pub fn requires_connections(handles: &[&str]) -> ValidityCheck {
    let handles: Vec<String> = handles.iter().map(|h| h.to_string()).collect();
    Arc::new(move |edges: &[FlowEdge], node_id: &str| {
        handles.iter().all(|handle| {
            edges.iter().any(|e| {
                (e.source == node_id && &e.source_handle == handle)
                    || (e.target == node_id && &e.target_handle == handle)
            })
        })
    })
}

/// The factory used when a type declares none: a node carrying the schema defaults.
pub fn default_factory() -> NodeFactory {
    Arc::new(|schema: &NodeSchema, node_id: &str| {
        FlowNode::new(node_id, &schema.node_type, schema.default_bag())
    })
}

/// Everything the editor needs to know about one node type.
#[derive(Clone)]
pub struct NodeTypeDefinition {
    pub schema: NodeSchema,
    pub handles: HandleCompatibility,
    pub menu: MenuInfo,
    pub factory: NodeFactory,
    pub validity: Option<ValidityCheck>,
    /// The handle followed when walking the flow forward.
    pub forward_handle: Option<String>,
    pub outputs: Vec<ProvidedOutput>,
    /// Whether outputs are visible to every node, not only siblings and downstream nodes.
    pub global_outputs: bool,
    /// Whether other nodes can be placed inside this one.
    pub container: bool,
}

impl NodeTypeDefinition {
    pub fn new(schema: NodeSchema, handles: HandleCompatibility, menu: MenuInfo) -> Self {
        Self {
            schema,
            handles,
            menu,
            factory: default_factory(),
            validity: None,
            forward_handle: None,
            outputs: Vec::new(),
            global_outputs: false,
            container: false,
        }
    }

    pub fn type_id(&self) -> &str {
        &self.schema.node_type
    }

    pub fn with_factory(mut self, factory: NodeFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_validity(mut self, check: ValidityCheck) -> Self {
        self.validity = Some(check);
        self
    }

    pub fn with_forward_handle(mut self, handle: &str) -> Self {
        self.forward_handle = Some(handle.to_string());
        self
    }

    pub fn with_output(mut self, output: ProvidedOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn with_global_outputs(mut self) -> Self {
        self.global_outputs = true;
        self
    }

    pub fn as_container(mut self) -> Self {
        self.container = true;
        self
    }

    /// Runs the factory for a new node with the given id.
    pub fn create_node(&self, node_id: &str) -> FlowNode {
        (self.factory)(&self.schema, node_id)
    }

    pub fn default_data(&self) -> DataBag {
        self.schema.default_bag()
    }
}

impl fmt::Debug for NodeTypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTypeDefinition")
            .field("schema", &self.schema)
            .field("handles", &self.handles)
            .field("menu", &self.menu)
            .field("validity", &self.validity.is_some())
            .field("forward_handle", &self.forward_handle)
            .field("outputs", &self.outputs)
            .field("global_outputs", &self.global_outputs)
            .field("container", &self.container)
            .finish()
    }
}

/// A node type described in JSON, for schema packs loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeConfig {
    pub schema: NodeSchema,
    #[serde(default)]
    pub handles: HandleCompatibility,
    pub menu: MenuInfo,
    #[serde(default)]
    pub forward_handle: Option<String>,
    /// Handles that must carry at least one edge for the node to be valid.
    #[serde(default)]
    pub required_handles: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<ProvidedOutput>,
    #[serde(default)]
    pub global_outputs: bool,
    #[serde(default)]
    pub container: bool,
}

impl From<NodeTypeConfig> for NodeTypeDefinition {
    fn from(config: NodeTypeConfig) -> Self {
        let mut definition = NodeTypeDefinition::new(config.schema, config.handles, config.menu);
        definition.forward_handle = config.forward_handle;
        definition.outputs = config.outputs;
        definition.global_outputs = config.global_outputs;
        definition.container = config.container;
        if !config.required_handles.is_empty() {
            let required: Vec<&str> = config.required_handles.iter().map(String::as_str).collect();
            definition.validity = Some(requires_connections(&required));
        }
        definition
    }
}
