//! Per-type rendering and event parsing.
//!
//! Each property type maps to a [`FieldHandler`]: a render function producing a
//! [`Control`], the inverse mapping from a [`ControlEvent`] back to a stored
//! value, and the type's zero value. The form looks the handler up once per
//! property instead of switching on the type tag everywhere.

use super::coerce::{read_array, read_bool, read_f64, read_i64, read_string, read_string_list};
use super::records::{LivePrompt, Question, SubmissionPrompt, TestCase, Variable};
use super::selectors::{GraphOptions, SelectorOption};
use super::upload::{AssetDescriptor, AssetKind};
use crate::data::DataBag;
use crate::schema::{PropertyDefinition, PropertyType, SelectOption};
use itertools::Itertools;
use serde_json::{Value, json};

/// Everything a render function may look at.
pub struct FieldContext<'a> {
    pub property: &'a PropertyDefinition,
    /// The stored value, already coerced to the property's shape.
    pub value: &'a Value,
    pub draft: &'a DataBag,
    pub options: &'a GraphOptions,
}

/// A UI-independent description of one editable control.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    TextInput {
        value: String,
        placeholder: Option<String>,
    },
    TextArea {
        value: String,
        rows: u32,
        placeholder: Option<String>,
    },
    NumberInput {
        value: i64,
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    Checkbox {
        checked: bool,
    },
    Select {
        options: Vec<SelectOption>,
        selected: String,
    },
    Radio {
        options: Vec<SelectOption>,
        selected: String,
    },
    Slider {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    Upload {
        kind: AssetKind,
        assets: Vec<AssetDescriptor>,
        selected: Option<String>,
    },
    TextList {
        items: Vec<String>,
        /// Set when the length follows a count property.
        fixed_length: bool,
    },
    TestCases(Vec<TestCase>),
    Questions(Vec<Question>),
    SubmissionPrompts(Vec<SubmissionPrompt>),
    LivePrompts {
        prompts: Vec<LivePrompt>,
        list_variables: Vec<SelectorOption>,
        submission_prompts: Vec<SelectorOption>,
    },
    Variables(Vec<Variable>),
    MultiSelect {
        options: Vec<SelectorOption>,
        selected: Vec<String>,
    },
}

/// Raw input coming back from a rendered control.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Typed text, including text typed into numeric inputs.
    Input(String),
    Toggle(bool),
    /// Picked an option by value.
    Choose(String),
    Slide(f64),
    SelectMany(Vec<String>),
}

pub struct FieldHandler {
    pub render: fn(&FieldContext<'_>) -> Control,
    /// `None` when the event does not apply to this type.
    pub parse_event: fn(&PropertyDefinition, &Value, ControlEvent) -> Option<Value>,
    /// The type-appropriate zero value malformed data falls back to.
    pub default_for: fn(&PropertyDefinition) -> Value,
}

const TEXT: FieldHandler = FieldHandler {
    render: render_text,
    parse_event: parse_text,
    default_for: empty_default,
};
const TEXT_AREA: FieldHandler = FieldHandler {
    render: render_text_area,
    parse_event: parse_text,
    default_for: empty_default,
};
const NUMBER: FieldHandler = FieldHandler {
    render: render_number,
    parse_event: parse_number,
    default_for: empty_default,
};
const CHECKBOX: FieldHandler = FieldHandler {
    render: render_checkbox,
    parse_event: parse_checkbox,
    default_for: empty_default,
};
const SELECT: FieldHandler = FieldHandler {
    render: render_select,
    parse_event: parse_choice,
    default_for: first_option_default,
};
const RADIO: FieldHandler = FieldHandler {
    render: render_radio,
    parse_event: parse_choice,
    default_for: first_option_default,
};
const RANGE: FieldHandler = FieldHandler {
    render: render_range,
    parse_event: parse_range,
    default_for: range_default,
};
const UPLOAD: FieldHandler = FieldHandler {
    render: render_upload,
    parse_event: no_event,
    default_for: empty_default,
};
const TEXT_LIST: FieldHandler = FieldHandler {
    render: render_text_list,
    parse_event: no_event,
    default_for: empty_default,
};
const TEST_CASES: FieldHandler = FieldHandler {
    render: render_test_cases,
    parse_event: no_event,
    default_for: empty_default,
};
const QUESTIONS: FieldHandler = FieldHandler {
    render: render_questions,
    parse_event: no_event,
    default_for: empty_default,
};
const SUBMISSION_PROMPTS: FieldHandler = FieldHandler {
    render: render_submission_prompts,
    parse_event: no_event,
    default_for: empty_default,
};
const LIVE_PROMPTS: FieldHandler = FieldHandler {
    render: render_live_prompts,
    parse_event: no_event,
    default_for: empty_default,
};
const VARIABLES: FieldHandler = FieldHandler {
    render: render_variables,
    parse_event: no_event,
    default_for: empty_default,
};
const PROMPT_SELECTOR: FieldHandler = FieldHandler {
    render: render_prompt_selector,
    parse_event: parse_selection,
    default_for: empty_default,
};
const LIST_VARIABLE_SELECTOR: FieldHandler = FieldHandler {
    render: render_list_variable_selector,
    parse_event: parse_selection,
    default_for: empty_default,
};
const HIDDEN: FieldHandler = FieldHandler {
    render: render_hidden,
    parse_event: no_event,
    default_for: empty_default,
};

/// Looks up the handler for a property type.
pub fn handler_for(property_type: PropertyType) -> &'static FieldHandler {
    match property_type {
        PropertyType::Text => &TEXT,
        PropertyType::TextArea => &TEXT_AREA,
        PropertyType::Number => &NUMBER,
        PropertyType::Checkbox => &CHECKBOX,
        PropertyType::Select => &SELECT,
        PropertyType::Radio => &RADIO,
        PropertyType::Range => &RANGE,
        PropertyType::FileUpload | PropertyType::VideoUpload => &UPLOAD,
        PropertyType::DynamicTextList => &TEXT_LIST,
        PropertyType::TestCases => &TEST_CASES,
        PropertyType::MultipleChoiceQuestions => &QUESTIONS,
        PropertyType::SubmissionPrompts => &SUBMISSION_PROMPTS,
        PropertyType::LivePresentationPrompts => &LIVE_PROMPTS,
        PropertyType::Variables => &VARIABLES,
        PropertyType::PromptSelector => &PROMPT_SELECTOR,
        PropertyType::ListVariableSelector => &LIST_VARIABLE_SELECTOR,
        PropertyType::Hidden => &HIDDEN,
    }
}

// --- Defaults ---

fn empty_default(property: &PropertyDefinition) -> Value {
    property.property_type.empty_value()
}

fn first_option_default(property: &PropertyDefinition) -> Value {
    property
        .options
        .first()
        .map(|o| Value::String(o.value.clone()))
        .unwrap_or_else(|| Value::String(String::new()))
}

fn range_default(property: &PropertyDefinition) -> Value {
    json!(property.min.unwrap_or(0.0))
}

// --- Renderers ---

fn render_text(ctx: &FieldContext<'_>) -> Control {
    Control::TextInput {
        value: read_string(ctx.value, &ctx.property.key),
        placeholder: ctx.property.placeholder.clone(),
    }
}

fn render_text_area(ctx: &FieldContext<'_>) -> Control {
    Control::TextArea {
        value: read_string(ctx.value, &ctx.property.key),
        rows: ctx.property.rows.unwrap_or(3),
        placeholder: ctx.property.placeholder.clone(),
    }
}

fn render_number(ctx: &FieldContext<'_>) -> Control {
    Control::NumberInput {
        value: read_i64(ctx.value, &ctx.property.key),
        min: ctx.property.min,
        max: ctx.property.max,
        step: ctx.property.step,
    }
}

fn render_checkbox(ctx: &FieldContext<'_>) -> Control {
    Control::Checkbox {
        checked: read_bool(ctx.value, &ctx.property.key),
    }
}

fn render_select(ctx: &FieldContext<'_>) -> Control {
    Control::Select {
        options: ctx.property.options.clone(),
        selected: read_string(ctx.value, &ctx.property.key),
    }
}

fn render_radio(ctx: &FieldContext<'_>) -> Control {
    Control::Radio {
        options: ctx.property.options.clone(),
        selected: read_string(ctx.value, &ctx.property.key),
    }
}

fn render_range(ctx: &FieldContext<'_>) -> Control {
    Control::Slider {
        value: read_f64(ctx.value, &ctx.property.key),
        min: ctx.property.min.unwrap_or(0.0),
        max: ctx.property.max.unwrap_or(1.0),
        step: ctx.property.step.unwrap_or(0.1),
    }
}

fn render_upload(ctx: &FieldContext<'_>) -> Control {
    let kind = if ctx.property.property_type == PropertyType::VideoUpload {
        AssetKind::Video
    } else {
        AssetKind::Document
    };
    let selected = ctx
        .property
        .selection_key
        .as_deref()
        .and_then(|key| ctx.draft.get(key))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Control::Upload {
        kind,
        assets: AssetDescriptor::read_list(ctx.value, &ctx.property.key),
        selected,
    }
}

fn render_text_list(ctx: &FieldContext<'_>) -> Control {
    Control::TextList {
        items: read_string_list(ctx.value, &ctx.property.key),
        fixed_length: ctx.property.count_key.is_some(),
    }
}

fn render_test_cases(ctx: &FieldContext<'_>) -> Control {
    Control::TestCases(
        read_array(ctx.value, &ctx.property.key)
            .iter()
            .map(TestCase::from_value)
            .collect(),
    )
}

fn render_questions(ctx: &FieldContext<'_>) -> Control {
    Control::Questions(
        read_array(ctx.value, &ctx.property.key)
            .iter()
            .map(Question::from_value)
            .collect(),
    )
}

fn render_submission_prompts(ctx: &FieldContext<'_>) -> Control {
    Control::SubmissionPrompts(
        read_array(ctx.value, &ctx.property.key)
            .iter()
            .map(SubmissionPrompt::from_value)
            .collect(),
    )
}

fn render_live_prompts(ctx: &FieldContext<'_>) -> Control {
    Control::LivePrompts {
        prompts: read_array(ctx.value, &ctx.property.key)
            .iter()
            .map(LivePrompt::from_value)
            .collect(),
        list_variables: ctx.options.list_variables.clone(),
        submission_prompts: ctx.options.prompts.clone(),
    }
}

fn render_variables(ctx: &FieldContext<'_>) -> Control {
    Control::Variables(
        read_array(ctx.value, &ctx.property.key)
            .iter()
            .map(Variable::from_value)
            .collect(),
    )
}

fn render_prompt_selector(ctx: &FieldContext<'_>) -> Control {
    Control::MultiSelect {
        options: ctx.options.prompts.clone(),
        selected: read_string_list(ctx.value, &ctx.property.key),
    }
}

fn render_list_variable_selector(ctx: &FieldContext<'_>) -> Control {
    Control::MultiSelect {
        options: ctx.options.list_variables.clone(),
        selected: read_string_list(ctx.value, &ctx.property.key),
    }
}

// Hidden properties are filtered out before rendering; this only exists to
// keep the table total.
fn render_hidden(ctx: &FieldContext<'_>) -> Control {
    Control::TextInput {
        value: read_string(ctx.value, &ctx.property.key),
        placeholder: None,
    }
}

// --- Event parsers ---

fn no_event(_: &PropertyDefinition, _: &Value, _: ControlEvent) -> Option<Value> {
    None
}

fn parse_text(_: &PropertyDefinition, _: &Value, event: ControlEvent) -> Option<Value> {
    match event {
        ControlEvent::Input(text) => Some(Value::String(text)),
        _ => None,
    }
}

fn clamp(property: &PropertyDefinition, value: f64) -> f64 {
    let value = property.min.map_or(value, |min| value.max(min));
    property.max.map_or(value, |max| value.min(max))
}

/// Unparseable input keeps the current value.
fn parse_number(property: &PropertyDefinition, current: &Value, event: ControlEvent) -> Option<Value> {
    let parsed = match event {
        ControlEvent::Input(text) => text.trim().parse::<f64>().ok(),
        ControlEvent::Slide(value) => Some(value),
        _ => return None,
    };
    let value = match parsed {
        Some(v) if v.is_finite() => clamp(property, v.trunc()),
        _ => {
            log::debug!("Ignoring non-numeric input for '{}'", property.key);
            read_i64(current, &property.key) as f64
        }
    };
    Some(json!(value as i64))
}

fn parse_range(property: &PropertyDefinition, current: &Value, event: ControlEvent) -> Option<Value> {
    let parsed = match event {
        ControlEvent::Slide(value) => Some(value),
        ControlEvent::Input(text) => text.trim().parse::<f64>().ok(),
        _ => return None,
    };
    let value = match parsed {
        Some(v) if v.is_finite() => clamp(property, v),
        _ => read_f64(current, &property.key),
    };
    Some(json!(value))
}

fn parse_checkbox(_: &PropertyDefinition, _: &Value, event: ControlEvent) -> Option<Value> {
    match event {
        ControlEvent::Toggle(checked) => Some(Value::Bool(checked)),
        _ => None,
    }
}

/// Choosing a value that is not an option keeps the current value.
fn parse_choice(property: &PropertyDefinition, current: &Value, event: ControlEvent) -> Option<Value> {
    match event {
        ControlEvent::Choose(value) | ControlEvent::Input(value) => {
            if property.has_option(&value) {
                Some(Value::String(value))
            } else {
                log::debug!("'{}' is not an option of '{}'", value, property.key);
                Some(current.clone())
            }
        }
        _ => None,
    }
}

fn parse_selection(_: &PropertyDefinition, _: &Value, event: ControlEvent) -> Option<Value> {
    match event {
        ControlEvent::SelectMany(ids) => Some(Value::Array(
            ids.into_iter().unique().map(Value::String).collect(),
        )),
        _ => None,
    }
}
