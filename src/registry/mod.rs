use crate::error::{ConnectionError, RegistryError};
use crate::graph::{FlowEdge, FlowNode, WorkflowGraph};
use crate::schema::{HandleCompatibility, HandleDirection, HandleRef, HandleRule, NodeSchema};
use ahash::AHashMap;
use itertools::Itertools;

pub mod builtin;
mod definition;

pub use builtin::builtin_node_types;
pub use definition::*;

/// The single source of truth for node types: schemas, handle rules,
/// factories and menu metadata, keyed by type id.
///
/// A registry is built once at startup through [`RegistryBuilder`] or
/// [`build_registry`] and is read-only afterwards.
#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    definitions: AHashMap<String, NodeTypeDefinition>,
    order: Vec<String>,
    aliases: AHashMap<String, String>,
}

/// Result of checking a whole workflow against the registry.
#[derive(Debug, Default)]
pub struct GraphReport {
    pub invalid_edges: Vec<(FlowEdge, ConnectionError)>,
    /// Nodes whose type-specific validity check failed.
    pub misconfigured_nodes: Vec<String>,
    /// Nodes whose type is not registered.
    pub unknown_nodes: Vec<String>,
}

impl GraphReport {
    pub fn is_clean(&self) -> bool {
        self.invalid_edges.is_empty()
            && self.misconfigured_nodes.is_empty()
            && self.unknown_nodes.is_empty()
    }
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Adds a node type. Fails if its id is already taken.
    pub fn register_node_type(&mut self, definition: NodeTypeDefinition) -> Result<(), RegistryError> {
        let type_id = definition.type_id().to_string();
        if self.definitions.contains_key(&type_id) || self.aliases.contains_key(&type_id) {
            return Err(RegistryError::DuplicateType(type_id));
        }
        for dangling in definition.schema.dangling_references() {
            log::warn!("Node type '{}' references unknown property: {}", type_id, dangling);
        }
        self.order.push(type_id.clone());
        self.definitions.insert(type_id, definition);
        Ok(())
    }

    /// Makes `alias` resolve to the already registered `target` type.
    pub fn register_alias(&mut self, alias: &str, target: &str) -> Result<(), RegistryError> {
        if self.definitions.contains_key(alias) || self.aliases.contains_key(alias) {
            return Err(RegistryError::DuplicateType(alias.to_string()));
        }
        if !self.definitions.contains_key(target) {
            return Err(RegistryError::DanglingAlias {
                alias: alias.to_string(),
                target: target.to_string(),
            });
        }
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    /// Looks up a definition, following aliases.
    pub fn definition(&self, type_id: &str) -> Result<&NodeTypeDefinition, RegistryError> {
        let canonical = self.aliases.get(type_id).map(String::as_str).unwrap_or(type_id);
        self.definitions
            .get(canonical)
            .ok_or_else(|| RegistryError::UnknownType(type_id.to_string()))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.definition(type_id).is_ok()
    }

    pub fn schema(&self, type_id: &str) -> Result<&NodeSchema, RegistryError> {
        self.definition(type_id).map(|d| &d.schema)
    }

    pub fn handle_compatibility(&self, type_id: &str) -> Result<&HandleCompatibility, RegistryError> {
        self.definition(type_id).map(|d| &d.handles)
    }

    /// Registered type ids in declaration order.
    pub fn list_available_types(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// `(type id, menu info)` pairs in declaration order.
    pub fn menu_entries(&self) -> Vec<(&str, &MenuInfo)> {
        self.order
            .iter()
            .filter_map(|id| self.definitions.get(id).map(|d| (id.as_str(), &d.menu)))
            .collect()
    }

    /// Menu entries grouped by category. Categories appear in the order their
    /// first member was declared.
    pub fn menu_by_category(&self) -> Vec<(NodeCategory, Vec<(&str, &MenuInfo)>)> {
        let entries = self.menu_entries();
        entries
            .iter()
            .map(|(_, menu)| menu.category)
            .unique()
            .map(|category| {
                let members = entries
                    .iter()
                    .filter(|(_, menu)| menu.category == category)
                    .copied()
                    .collect();
                (category, members)
            })
            .collect()
    }

    /// Instantiates a new node of `type_id` through the type's factory.
    pub fn create_node(&self, type_id: &str, node_id: &str) -> Result<FlowNode, RegistryError> {
        self.definition(type_id).map(|d| d.create_node(node_id))
    }

    /// Runs the type's validity check. `None` if the type has no such check
    /// or is unknown.
    pub fn check_node_validity(&self, type_id: &str, edges: &[FlowEdge], node_id: &str) -> Option<bool> {
        let definition = self.definition(type_id).ok()?;
        definition.validity.as_ref().map(|check| check(edges, node_id))
    }

    /// Follows the single edge leaving the node's forward handle.
    pub fn next_node<'g>(&self, graph: &'g WorkflowGraph, node_id: &str) -> Option<&'g FlowNode> {
        let node = graph.node(node_id)?;
        let handle = self.definition(&node.node_type).ok()?.forward_handle.as_deref()?;
        let edge = graph.outgoing(node_id, handle).next()?;
        graph.node(&edge.target)
    }

    /// Walks forward from `start_id` until a node has no successor.
    /// Stops if a node is revisited.
    pub fn flow_sequence<'g>(&self, graph: &'g WorkflowGraph, start_id: &str) -> Vec<&'g FlowNode> {
        let mut sequence: Vec<&FlowNode> = Vec::new();
        let mut current = graph.node(start_id);
        while let Some(node) = current {
            if sequence.iter().any(|n| n.id == node.id) {
                log::warn!("Flow starting at '{}' loops back to '{}'", start_id, node.id);
                break;
            }
            sequence.push(node);
            current = self.next_node(graph, &node.id);
        }
        sequence
    }

    /// Checks whether `edge` may be added to `graph`.
    pub fn validate_connection(&self, graph: &WorkflowGraph, edge: &FlowEdge) -> Result<(), ConnectionError> {
        let (source, target) = self.check_compatibility(graph, edge)?;
        for (node_id, handle, rule) in [
            (&edge.source, &source, source.1),
            (&edge.target, &target, target.1),
        ] {
            let existing = graph.handle_degree(node_id, &handle.0.handle, rule.direction);
            if !rule.max_connections.allows(existing) {
                return Err(Self::limit_error(node_id, &handle.0, rule));
            }
        }
        Ok(())
    }

    /// Checks every edge and node of an existing workflow.
    pub fn validate_graph(&self, graph: &WorkflowGraph) -> GraphReport {
        let mut report = GraphReport::default();

        for node in &graph.nodes {
            match self.check_node_validity(&node.node_type, &graph.edges, &node.id) {
                Some(false) => report.misconfigured_nodes.push(node.id.clone()),
                Some(true) => {}
                None if !self.contains(&node.node_type) => report.unknown_nodes.push(node.id.clone()),
                None => {}
            }
        }

        for edge in &graph.edges {
            if let Err(e) = self.check_compatibility(graph, edge) {
                report.invalid_edges.push((edge.clone(), e));
            }
        }

        // Connection limits are checked per handle so that an overfull handle is
        // reported once for each surplus edge.
        let mut counts: AHashMap<(&str, &str, HandleDirection), usize> = AHashMap::new();
        for edge in &graph.edges {
            let endpoints = [
                (edge.source.as_str(), edge.source_handle.as_str(), HandleDirection::Source),
                (edge.target.as_str(), edge.target_handle.as_str(), HandleDirection::Target),
            ];
            for (node_id, handle, direction) in endpoints {
                let Some(rule) = self.rule_for(graph, node_id, handle) else {
                    continue;
                };
                if rule.direction != direction {
                    continue;
                }
                let count = counts.entry((node_id, handle, direction)).or_default();
                *count += 1;
                if !rule.max_connections.allows(*count - 1) {
                    let node_type = graph.node(node_id).map(|n| n.node_type.as_str()).unwrap_or_default();
                    report.invalid_edges.push((
                        edge.clone(),
                        Self::limit_error(node_id, &HandleRef::new(node_type, handle), rule),
                    ));
                }
            }
        }
        report
    }

    fn rule_for(&self, graph: &WorkflowGraph, node_id: &str, handle: &str) -> Option<&HandleRule> {
        let node = graph.node(node_id)?;
        self.definition(&node.node_type).ok()?.handles.rule(handle)
    }

    fn limit_error(node_id: &str, handle: &HandleRef, rule: &HandleRule) -> ConnectionError {
        let max = match rule.max_connections {
            crate::schema::ConnectionLimit::AtMost(max) => max,
            crate::schema::ConnectionLimit::Unbounded => usize::MAX,
        };
        ConnectionError::LimitReached {
            node_id: node_id.to_string(),
            handle: handle.clone(),
            max,
        }
    }

    /// Resolves both endpoints of `edge` and checks direction and mutual compatibility.
    fn check_compatibility<'r>(
        &'r self,
        graph: &WorkflowGraph,
        edge: &FlowEdge,
    ) -> Result<((HandleRef, &'r HandleRule), (HandleRef, &'r HandleRule)), ConnectionError> {
        let source = self.resolve_endpoint(graph, &edge.source, &edge.source_handle, HandleDirection::Source)?;
        let target = self.resolve_endpoint(graph, &edge.target, &edge.target_handle, HandleDirection::Target)?;

        if !source.1.compatible_with.contains(&target.0) {
            return Err(ConnectionError::Incompatible {
                from: source.0.clone(),
                to: target.0.clone(),
            });
        }
        if !target.1.compatible_with.contains(&source.0) {
            return Err(ConnectionError::Incompatible {
                from: target.0.clone(),
                to: source.0.clone(),
            });
        }
        Ok((source, target))
    }

    fn resolve_endpoint<'r>(
        &'r self,
        graph: &WorkflowGraph,
        node_id: &str,
        handle: &str,
        expected: HandleDirection,
    ) -> Result<(HandleRef, &'r HandleRule), ConnectionError> {
        let node = graph
            .node(node_id)
            .ok_or_else(|| ConnectionError::NodeNotFound(node_id.to_string()))?;
        let definition = self
            .definition(&node.node_type)
            .map_err(|_| ConnectionError::UnknownNodeType {
                node_id: node_id.to_string(),
                type_name: node.node_type.clone(),
            })?;
        let handle_ref = HandleRef::new(definition.type_id(), handle);
        let rule = definition
            .handles
            .rule(handle)
            .ok_or_else(|| ConnectionError::UnknownHandle {
                node_type: definition.type_id().to_string(),
                handle: handle.to_string(),
            })?;
        if rule.direction != expected {
            return Err(ConnectionError::WrongDirection {
                handle: handle_ref,
                expected: expected.name(),
                actual: rule.direction.name(),
            });
        }
        Ok((handle_ref, rule))
    }
}

/// Collects node type definitions and aliases, then builds a registry in one step.
#[derive(Default)]
pub struct RegistryBuilder {
    definitions: Vec<NodeTypeDefinition>,
    aliases: Vec<(String, String)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the built-in educational node catalog.
    pub fn with_builtin_types(mut self) -> Self {
        self.definitions.extend(builtin_node_types());
        self
    }

    pub fn with_node_type(mut self, definition: NodeTypeDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Maps a legacy or user-facing type name onto a registered type.
    pub fn with_type_alias(mut self, alias: &str, target: &str) -> Self {
        self.aliases.push((alias.to_string(), target.to_string()));
        self
    }

    /// Adds node types described as a JSON array of [`NodeTypeConfig`].
    pub fn with_config_json(mut self, json: &str) -> Result<Self, RegistryError> {
        let configs: Vec<NodeTypeConfig> =
            serde_json::from_str(json).map_err(|e| RegistryError::ConfigParseError(e.to_string()))?;
        self.definitions.extend(configs.into_iter().map(NodeTypeDefinition::from));
        Ok(self)
    }

    pub fn build(self) -> Result<NodeTypeRegistry, RegistryError> {
        let mut registry = build_registry(self.definitions)?;
        for (alias, target) in self.aliases {
            registry.register_alias(&alias, &target)?;
        }
        Ok(registry)
    }
}

/// Builds a registry from an explicit list of definitions, in order.
pub fn build_registry(
    definitions: impl IntoIterator<Item = NodeTypeDefinition>,
) -> Result<NodeTypeRegistry, RegistryError> {
    let mut registry = NodeTypeRegistry::new();
    for definition in definitions {
        registry.register_node_type(definition)?;
    }
    log::info!(
        "Node type registry built with {} types: {}",
        registry.order.len(),
        registry.order.iter().join(", ")
    );
    Ok(registry)
}
