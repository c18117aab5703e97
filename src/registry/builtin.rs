//! The built-in node catalog of the learning-activity builder.
//!
//! Definitions are listed in menu order. Every "step" node takes part in the
//! linear flow through an `in` target handle and a `next` source handle.

use super::definition::{
    MenuInfo, NodeCategory, NodeTypeDefinition, ProvidedOutput, requires_connections,
};
use crate::schema::{HandleCompatibility, NodeSchema, PropertyDefinition, PropertyType};
use serde_json::json;

/// Node types that sit in the linear flow.
const STEP_TYPES: &[&str] = &[
    "page",
    "aiAgent",
    "prompt",
    "multipleChoice",
    "submission",
    "livePresentation",
    "codingExercise",
    "documentUpload",
    "video",
    "grouping",
    "theming",
    "end",
];

/// Source handles that may feed a step's `in` handle.
fn step_sources() -> Vec<String> {
    STEP_TYPES
        .iter()
        .filter(|t| **t != "end")
        .map(|t| {
            if *t == "aiAgent" {
                "aiAgent:output".to_string()
            } else {
                format!("{}:next", t)
            }
        })
        .chain(std::iter::once("start:next".to_string()))
        .collect()
}

/// Target handles a step's forward handle may point at.
fn step_targets() -> Vec<String> {
    STEP_TYPES.iter().map(|t| format!("{}:in", t)).collect()
}

/// `in` + `next` handles shared by ordinary steps.
fn step_handles() -> HandleCompatibility {
    HandleCompatibility::new()
        .target("in", -1, step_sources())
        .source("next", 1, step_targets())
}

fn step(schema: NodeSchema, menu: MenuInfo) -> NodeTypeDefinition {
    NodeTypeDefinition::new(schema, step_handles(), menu).with_forward_handle("next")
}

/// Returns the built-in node types, in menu order.
pub fn builtin_node_types() -> Vec<NodeTypeDefinition> {
    vec![
        start(),
        page(),
        global_variables(),
        ai_agent(),
        llm_model(),
        prompt(),
        multiple_choice(),
        submission(),
        live_presentation(),
        coding_exercise(),
        document_upload(),
        video(),
        grouping(),
        theming(),
        end(),
    ]
}

fn start() -> NodeTypeDefinition {
    NodeTypeDefinition::new(
        NodeSchema::new("start", "Start").with_property(
            PropertyDefinition::new("title", "Activity title", PropertyType::Text)
                .with_placeholder("Untitled activity"),
        ),
        HandleCompatibility::new().source("next", 1, step_targets()),
        MenuInfo::new("Start", "play", NodeCategory::Starter, "Entry point of the activity"),
    )
    .with_forward_handle("next")
}

fn end() -> NodeTypeDefinition {
    NodeTypeDefinition::new(
        NodeSchema::new("end", "End").with_property(
            PropertyDefinition::new("closing_message", "Closing message", PropertyType::TextArea)
                .with_rows(3),
        ),
        HandleCompatibility::new().target("in", -1, step_sources()),
        MenuInfo::new("End", "flag", NodeCategory::Starter, "Finishes the activity"),
    )
}

fn page() -> NodeTypeDefinition {
    step(
        NodeSchema::new("page", "Page")
            .with_property(PropertyDefinition::new("title", "Title", PropertyType::Text))
            .with_property(
                PropertyDefinition::new("show_progress", "Show progress bar", PropertyType::Checkbox)
                    .with_default(json!(true)),
            ),
        MenuInfo::new("Page", "layout", NodeCategory::Structure, "Groups content shown together"),
    )
    .as_container()
}

fn global_variables() -> NodeTypeDefinition {
    NodeTypeDefinition::new(
        NodeSchema::new("globalVariables", "Global variables")
            .with_property(PropertyDefinition::new("variables", "Variables", PropertyType::Variables)),
        HandleCompatibility::new(),
        MenuInfo::new(
            "Global variables",
            "braces",
            NodeCategory::Structure,
            "Variables shared by every node of the activity",
        ),
    )
    .with_output(ProvidedOutput::ListVariables {
        key: "variables".to_string(),
    })
    .with_global_outputs()
}

fn ai_agent() -> NodeTypeDefinition {
    let handles = HandleCompatibility::new()
        .target("in", -1, step_sources())
        .target("model", 1, ["llmModel:model"])
        .source("output", 1, step_targets());

    NodeTypeDefinition::new(
        NodeSchema::new("aiAgent", "AI agent")
            .with_property(PropertyDefinition::new("name", "Agent name", PropertyType::Text))
            .with_property(
                PropertyDefinition::new("instructions", "Instructions", PropertyType::TextArea)
                    .with_rows(6)
                    .with_placeholder("Describe how the agent should guide students"),
            )
            .with_property(
                PropertyDefinition::new("max_turns", "Maximum turns", PropertyType::Number)
                    .with_range(1.0, 50.0, 1.0)
                    .with_default(json!(10)),
            )
            .with_property(PropertyDefinition::new(
                "context_prompts",
                "Use submissions as context",
                PropertyType::PromptSelector,
            ))
            .with_property(
                PropertyDefinition::new("persona", "Persona", PropertyType::Radio).with_options(&[
                    ("tutor", "Tutor"),
                    ("peer", "Peer"),
                    ("examiner", "Examiner"),
                ]),
            ),
        handles,
        MenuInfo::new("AI agent", "bot", NodeCategory::Agent, "A chat agent students talk to"),
    )
    .with_validity(requires_connections(&["model", "output"]))
    .with_forward_handle("output")
}

fn llm_model() -> NodeTypeDefinition {
    NodeTypeDefinition::new(
        NodeSchema::new("llmModel", "Language model")
            .with_property(
                PropertyDefinition::new("model", "Model", PropertyType::Select).with_options(&[
                    ("gpt-4o", "GPT-4o"),
                    ("gpt-4o-mini", "GPT-4o mini"),
                    ("claude-sonnet", "Claude Sonnet"),
                ]),
            )
            .with_property(
                PropertyDefinition::new("temperature", "Temperature", PropertyType::Range)
                    .with_range(0.0, 1.0, 0.1)
                    .with_default(json!(0.7)),
            ),
        HandleCompatibility::new().source("model", -1, ["aiAgent:model"]),
        MenuInfo::new("Language model", "cpu", NodeCategory::Agent, "The model an agent runs on"),
    )
}

fn prompt() -> NodeTypeDefinition {
    step(
        NodeSchema::new("prompt", "Prompt").with_property(
            PropertyDefinition::new("text", "Prompt text", PropertyType::TextArea).with_rows(4),
        ),
        MenuInfo::new("Prompt", "message", NodeCategory::Content, "Shows a text prompt"),
    )
}

fn multiple_choice() -> NodeTypeDefinition {
    step(
        NodeSchema::new("multipleChoice", "Multiple choice quiz")
            .with_property(PropertyDefinition::new(
                "questions",
                "Questions",
                PropertyType::MultipleChoiceQuestions,
            ))
            .with_property(PropertyDefinition::new(
                "shuffle_answers",
                "Shuffle answers",
                PropertyType::Checkbox,
            ))
            .with_property(PropertyDefinition::new(
                "enable_feedback",
                "Show feedback per answer",
                PropertyType::Checkbox,
            ))
            .with_property(
                PropertyDefinition::new("adaptive_flow", "Adapt flow to answers", PropertyType::Checkbox)
                    .visible_when("enable_feedback", json!(true)),
            )
            .with_property(
                PropertyDefinition::new(
                    "repeat_until_correct",
                    "Repeat until correct",
                    PropertyType::Checkbox,
                )
                .visible_when("enable_feedback", json!(true))
                .visible_when("adaptive_flow", json!(true)),
            )
            .with_property(
                PropertyDefinition::new("max_attempts", "Maximum attempts", PropertyType::Number)
                    .with_range(1.0, 10.0, 1.0)
                    .with_default(json!(3))
                    .visible_when("enable_feedback", json!(true))
                    .visible_when("adaptive_flow", json!(true))
                    .visible_when("repeat_until_correct", json!(true)),
            ),
        MenuInfo::new(
            "Multiple choice",
            "list-checks",
            NodeCategory::Content,
            "A quiz with one correct answer per question",
        ),
    )
}

fn submission() -> NodeTypeDefinition {
    step(
        NodeSchema::new("submission", "Submission").with_property(PropertyDefinition::new(
            "submission_prompts",
            "Prompts",
            PropertyType::SubmissionPrompts,
        )),
        MenuInfo::new("Submission", "upload", NodeCategory::Content, "Collects student answers"),
    )
    .with_output(ProvidedOutput::Prompts {
        key: "submission_prompts".to_string(),
    })
}

fn live_presentation() -> NodeTypeDefinition {
    step(
        NodeSchema::new("livePresentation", "Live presentation")
            .with_property(PropertyDefinition::new("title", "Title", PropertyType::Text))
            .with_property(PropertyDefinition::new(
                "prompts",
                "Prompts",
                PropertyType::LivePresentationPrompts,
            ))
            .with_property(
                PropertyDefinition::new("show_results", "Show results", PropertyType::Radio)
                    .with_options(&[("live", "Live"), ("after", "After each prompt")]),
            ),
        MenuInfo::new(
            "Live presentation",
            "presentation",
            NodeCategory::Content,
            "Teacher-paced prompts shown to the whole class",
        ),
    )
}

fn coding_exercise() -> NodeTypeDefinition {
    step(
        NodeSchema::new("codingExercise", "Coding exercise")
            .with_property(PropertyDefinition::new("function_name", "Function name", PropertyType::Text))
            .with_property(
                PropertyDefinition::new("language", "Language", PropertyType::Select)
                    .with_options(&[("python", "Python"), ("javascript", "JavaScript")]),
            )
            .with_property(
                PropertyDefinition::new("parameter_count", "Number of parameters", PropertyType::Number)
                    .with_min(0.0)
                    .with_default(json!(1)),
            )
            .with_property(
                PropertyDefinition::new("parameter_names", "Parameter names", PropertyType::DynamicTextList)
                    .with_count_key("parameter_count")
                    .with_default(json!([""])),
            )
            .with_property(
                PropertyDefinition::new("test_cases", "Test cases", PropertyType::TestCases)
                    .with_count_key("parameter_count"),
            ),
        MenuInfo::new(
            "Coding exercise",
            "code",
            NodeCategory::Content,
            "A function students implement, checked against test cases",
        ),
    )
}

fn document_upload() -> NodeTypeDefinition {
    step(
        NodeSchema::new("documentUpload", "Documents")
            .with_property(
                PropertyDefinition::new("documents", "Documents", PropertyType::FileUpload)
                    .with_selection_key("selected_document"),
            )
            .with_property(PropertyDefinition::hidden("selected_document"))
            .with_property(PropertyDefinition::new("instructions", "Instructions", PropertyType::TextArea)),
        MenuInfo::new(
            "Documents",
            "file-text",
            NodeCategory::Content,
            "Reading material students work with",
        ),
    )
}

fn video() -> NodeTypeDefinition {
    step(
        NodeSchema::new("video", "Video")
            .with_property(
                PropertyDefinition::new("videos", "Videos", PropertyType::VideoUpload)
                    .with_selection_key("selected_video"),
            )
            .with_property(PropertyDefinition::hidden("selected_video"))
            .with_property(PropertyDefinition::new("autoplay", "Autoplay", PropertyType::Checkbox)),
        MenuInfo::new("Video", "film", NodeCategory::Content, "A video students watch"),
    )
}

fn grouping() -> NodeTypeDefinition {
    step(
        NodeSchema::new("grouping", "Grouping")
            .with_property(
                PropertyDefinition::new("group_size", "Group size", PropertyType::Number)
                    .with_range(2.0, 10.0, 1.0)
                    .with_default(json!(3)),
            )
            .with_property(
                PropertyDefinition::new("method", "Grouping method", PropertyType::Select).with_options(&[
                    ("random", "Random"),
                    ("similar", "Similar answers"),
                    ("diverse", "Diverse answers"),
                ]),
            )
            .with_property(
                PropertyDefinition::new("source_prompts", "Group by answers to", PropertyType::PromptSelector)
                    .visible_when("method", json!("similar")),
            )
            .with_property(
                PropertyDefinition::new("output_variable", "Store groups as", PropertyType::Text)
                    .with_default(json!("groups")),
            ),
        MenuInfo::new(
            "Grouping",
            "users",
            NodeCategory::Behaviour,
            "Splits the class into groups for the nodes it contains",
        ),
    )
    .with_output(ProvidedOutput::ListVariable {
        name_key: "output_variable".to_string(),
    })
    .as_container()
}

fn theming() -> NodeTypeDefinition {
    step(
        NodeSchema::new("theming", "Theming")
            .with_property(
                PropertyDefinition::new("theme_count", "Number of themes", PropertyType::Number)
                    .with_min(0.0)
                    .with_default(json!(1)),
            )
            .with_property(
                PropertyDefinition::new("themes", "Themes", PropertyType::DynamicTextList)
                    .with_count_key("theme_count")
                    .with_default(json!([""])),
            )
            .with_property(PropertyDefinition::new(
                "assign_from",
                "Assign themes per list",
                PropertyType::ListVariableSelector,
            )),
        MenuInfo::new(
            "Theming",
            "palette",
            NodeCategory::Behaviour,
            "Assigns a theme to each student or group",
        ),
    )
    .as_container()
}
