//! Common test utilities for building registries, data bags and workflows.
use serde_json::{Value, json};
use settei::prelude::*;

/// A registry holding the built-in node catalog.
#[allow(dead_code)]
pub fn registry() -> NodeTypeRegistry {
    RegistryBuilder::new()
        .with_builtin_types()
        .build()
        .expect("built-in registry should build")
}

/// The built-in catalog plus `slots`: a count with no bounds sizing a text list
/// and a question list.
#[allow(dead_code)]
pub fn unbounded_registry() -> NodeTypeRegistry {
    let mut registry = registry();
    registry
        .register_node_type(NodeTypeDefinition::new(
            NodeSchema::new("slots", "Slots")
                .with_property(
                    PropertyDefinition::new("slot_count", "Slots", PropertyType::Number).with_default(json!(0)),
                )
                .with_property(
                    PropertyDefinition::new("slot_names", "Slot names", PropertyType::DynamicTextList)
                        .with_count_key("slot_count")
                        .with_default(json!([])),
                )
                .with_property(
                    PropertyDefinition::new("slot_questions", "Questions", PropertyType::MultipleChoiceQuestions)
                        .with_count_key("slot_count")
                        .with_default(json!([])),
                ),
            HandleCompatibility::new(),
            MenuInfo::new("Slots", "list", NodeCategory::Content, "Numbered slots"),
        ))
        .expect("slots type should register");
    registry
}

/// Builds a data bag from a JSON object literal.
#[allow(dead_code)]
pub fn bag(value: Value) -> DataBag {
    DataBag::from_json(value)
}

/// A small lesson:
///
/// `start -> page(p1)[submission s1, livePresentation lp1] -> grouping g1 -> end`
///
/// plus a global variables node holding one list and one text variable, and an
/// AI agent wired to a model inside the page.
#[allow(dead_code)]
pub fn lesson_graph() -> WorkflowGraph {
    let nodes = vec![
        FlowNode::new("start", "start", DataBag::new()),
        FlowNode::new(
            "vars",
            "globalVariables",
            bag(json!({
                "variables": [
                    { "name": "topics", "type": "list", "items": ["rivers", "mountains"] },
                    { "name": "motto", "type": "text" }
                ]
            })),
        ),
        FlowNode::new("p1", "page", bag(json!({ "title": "Warm-up" }))),
        FlowNode::new(
            "s1",
            "submission",
            bag(json!({
                "submission_prompts": [
                    { "id": "p-idea", "text": "Your idea", "mediaType": "textarea" },
                    { "id": "", "text": "", "mediaType": "list", "items": 3 }
                ]
            })),
        )
        .with_parent("p1"),
        FlowNode::new("lp1", "livePresentation", bag(json!({ "title": "Discuss" }))).with_parent("p1"),
        FlowNode::new("agent", "aiAgent", DataBag::new()).with_parent("p1"),
        FlowNode::new("model", "llmModel", DataBag::new()).with_parent("p1"),
        FlowNode::new("g1", "grouping", bag(json!({ "output_variable": "teams" }))),
        FlowNode::new("lp2", "livePresentation", DataBag::new()).with_parent("g1"),
        FlowNode::new("end", "end", DataBag::new()),
    ];
    let edges = vec![
        FlowEdge::new("start", "next", "p1", "in"),
        FlowEdge::new("p1", "next", "g1", "in"),
        FlowEdge::new("g1", "next", "end", "in"),
        FlowEdge::new("model", "model", "agent", "model"),
    ];
    WorkflowGraph::new(nodes, edges)
}

/// A form host that records what the form reported.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingHost {
    pub saved: Vec<(String, DataBag)>,
    pub closed: Vec<String>,
}

impl FormHost for RecordingHost {
    fn on_save(&mut self, node_id: &str, data: DataBag) {
        self.saved.push((node_id.to_string(), data));
    }

    fn on_close(&mut self, node_id: &str) {
        self.closed.push(node_id.to_string());
    }
}
