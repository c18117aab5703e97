use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// The closed set of editable property kinds a node schema may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "textarea")]
    TextArea,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "checkbox")]
    Checkbox,
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "file")]
    FileUpload,
    #[serde(rename = "dynamicTextList")]
    DynamicTextList,
    #[serde(rename = "testCases")]
    TestCases,
    #[serde(rename = "multipleChoiceQuestions")]
    MultipleChoiceQuestions,
    #[serde(rename = "submissionPrompts")]
    SubmissionPrompts,
    #[serde(rename = "livePresentationPrompts")]
    LivePresentationPrompts,
    #[serde(rename = "variables")]
    Variables,
    #[serde(rename = "promptSelector")]
    PromptSelector,
    #[serde(rename = "listVariableSelector")]
    ListVariableSelector,
    #[serde(rename = "radio")]
    Radio,
    #[serde(rename = "video")]
    VideoUpload,
    #[serde(rename = "hidden")]
    Hidden,
}

impl PropertyType {
    /// The tag used for this type in schema JSON.
    pub fn tag(&self) -> &'static str {
        match self {
            PropertyType::Text => "text",
            PropertyType::TextArea => "textarea",
            PropertyType::Number => "number",
            PropertyType::Checkbox => "checkbox",
            PropertyType::Select => "select",
            PropertyType::Range => "range",
            PropertyType::FileUpload => "file",
            PropertyType::DynamicTextList => "dynamicTextList",
            PropertyType::TestCases => "testCases",
            PropertyType::MultipleChoiceQuestions => "multipleChoiceQuestions",
            PropertyType::SubmissionPrompts => "submissionPrompts",
            PropertyType::LivePresentationPrompts => "livePresentationPrompts",
            PropertyType::Variables => "variables",
            PropertyType::PromptSelector => "promptSelector",
            PropertyType::ListVariableSelector => "listVariableSelector",
            PropertyType::Radio => "radio",
            PropertyType::VideoUpload => "video",
            PropertyType::Hidden => "hidden",
        }
    }

    /// Types whose value is a list of structured records.
    pub fn is_record_list(&self) -> bool {
        matches!(
            self,
            PropertyType::TestCases
                | PropertyType::MultipleChoiceQuestions
                | PropertyType::SubmissionPrompts
                | PropertyType::LivePresentationPrompts
                | PropertyType::Variables
        )
    }

    /// Types whose value is a JSON array.
    pub fn is_list(&self) -> bool {
        self.is_record_list()
            || matches!(
                self,
                PropertyType::DynamicTextList
                    | PropertyType::PromptSelector
                    | PropertyType::ListVariableSelector
                    | PropertyType::FileUpload
                    | PropertyType::VideoUpload
            )
    }

    /// The empty value of this type, used when a schema declares no default.
    pub fn empty_value(&self) -> Value {
        match self {
            PropertyType::Number | PropertyType::Range => json!(0),
            PropertyType::Checkbox => Value::Bool(false),
            PropertyType::Hidden => Value::Null,
            t if t.is_list() => Value::Array(Vec::new()),
            _ => Value::String(String::new()),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One enumerated choice of a select or radio property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// A visibility condition: the property is shown only while `key` equals `equals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityCondition {
    pub key: String,
    pub equals: Value,
}

/// Describes one editable field of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Names the integer property that dictates this list's length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_key: Option<String>,
    /// Names the hidden sibling that stores the selected upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visible_when: Vec<VisibilityCondition>,
}

impl PropertyDefinition {
    pub fn new(key: &str, label: &str, property_type: PropertyType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            property_type,
            default_value: None,
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
            rows: None,
            placeholder: None,
            count_key: None,
            selection_key: None,
            visible_when: Vec::new(),
        }
    }

    /// A hidden passthrough property.
    pub fn hidden(key: &str) -> Self {
        Self::new(key, key, PropertyType::Hidden)
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(value, label)| SelectOption {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect();
        self
    }

    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn with_count_key(mut self, count_key: &str) -> Self {
        self.count_key = Some(count_key.to_string());
        self
    }

    pub fn with_selection_key(mut self, selection_key: &str) -> Self {
        self.selection_key = Some(selection_key.to_string());
        self
    }

    /// Adds a visibility condition. Multiple conditions must all hold.
    pub fn visible_when(mut self, key: &str, equals: Value) -> Self {
        self.visible_when.push(VisibilityCondition {
            key: key.to_string(),
            equals,
        });
        self
    }

    /// The declared default, or the type's empty value.
    ///
    /// Select and radio properties without a default fall back to their first option.
    pub fn default_value(&self) -> Value {
        if let Some(value) = &self.default_value {
            return value.clone();
        }
        match self.property_type {
            PropertyType::Select | PropertyType::Radio => self
                .options
                .first()
                .map(|o| Value::String(o.value.clone()))
                .unwrap_or_else(|| self.property_type.empty_value()),
            PropertyType::Number | PropertyType::Range => {
                self.min.map(|m| json!(m as i64)).unwrap_or_else(|| json!(0))
            }
            _ => self.property_type.empty_value(),
        }
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}
