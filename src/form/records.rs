//! Structured records stored inside list properties, and the edits they accept.
//!
//! Records are parsed leniently from whatever JSON is stored and serialized
//! back in canonical form. Optional sub-fields that belong to a disabled
//! feature are omitted from the serialized record. Keys a record does not
//! model are kept as they were stored.

use super::coerce::{read_bool, read_count, read_optional_string, read_string, read_string_list};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fewest answers a multiple-choice question keeps.
pub const MIN_ANSWERS: usize = 2;
/// Fewest options a multiple-choice submission prompt keeps.
pub const MIN_OPTIONS: usize = 2;

/// Why a record edit was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordEditError {
    IndexOutOfRange { index: usize, len: usize },
    MinimumAnswers,
    MinimumOptions,
    Inactive(&'static str),
    WrongRecordType,
}

type EditResult = Result<(), RecordEditError>;

static NULL: Value = Value::Null;

fn field<'a>(value: &'a Value, name: &str) -> &'a Value {
    value.get(name).unwrap_or(&NULL)
}

fn check_index(index: usize, len: usize) -> EditResult {
    if index < len {
        Ok(())
    } else {
        Err(RecordEditError::IndexOutOfRange { index, len })
    }
}

fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Keys of `value` outside `known`, carried through edits unchanged.
fn extra_fields(value: &Value, known: &[&str]) -> Map<String, Value> {
    value
        .as_object()
        .map(|object| {
            object
                .iter()
                .filter(|(key, _)| !known.contains(&key.as_str()))
                .map(|(key, v)| (key.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn to_json<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

// --- Test cases ---

/// One test case of a coding exercise: arguments plus the expected result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub parameters: Vec<String>,
    pub expected_result: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TestCase {
    pub fn blank(parameter_count: usize) -> Self {
        Self {
            parameters: vec![String::new(); parameter_count],
            expected_result: String::new(),
            extra: Map::new(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        Self {
            parameters: read_string_list(field(value, "parameters"), "testCase.parameters"),
            expected_result: read_string(field(value, "expectedResult"), "testCase.expectedResult"),
            extra: extra_fields(value, &["parameters", "expectedResult"]),
        }
    }

    pub fn to_value(&self) -> Value {
        to_json(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestCaseEdit {
    SetParameter { index: usize, value: String },
    SetExpectedResult(String),
}

impl TestCaseEdit {
    pub(crate) fn apply(self, record: &mut TestCase) -> EditResult {
        match self {
            TestCaseEdit::SetParameter { index, value } => {
                check_index(index, record.parameters.len())?;
                record.parameters[index] = value;
            }
            TestCaseEdit::SetExpectedResult(value) => record.expected_result = value,
        }
        Ok(())
    }
}

// --- Multiple-choice questions ---

/// A quiz question with one correct answer and optional per-answer feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub answers: Vec<String>,
    pub correct_answer: usize,
    /// Parallel to `answers` whenever present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_messages: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn blank() -> Self {
        Self {
            text: String::new(),
            answers: vec![String::new(); MIN_ANSWERS],
            correct_answer: 0,
            feedback_messages: None,
            extra: Map::new(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let feedback_messages = match field(value, "feedbackMessages") {
            Value::Null => None,
            v => Some(read_string_list(v, "question.feedbackMessages")),
        };
        let mut question = Self {
            text: read_string(field(value, "text"), "question.text"),
            answers: read_string_list(field(value, "answers"), "question.answers"),
            correct_answer: read_count(field(value, "correctAnswer"), "question.correctAnswer"),
            feedback_messages,
            extra: extra_fields(value, &["text", "answers", "correctAnswer", "feedbackMessages"]),
        };
        question.normalize();
        question
    }

    pub fn to_value(&self) -> Value {
        to_json(self)
    }

    /// Keeps feedback parallel to answers and the correct index in range.
    fn normalize(&mut self) {
        let len = self.answers.len();
        if let Some(feedback) = &mut self.feedback_messages {
            feedback.resize(len, String::new());
        }
        if self.correct_answer >= len {
            self.correct_answer = len.saturating_sub(1);
        }
    }

    /// Removes answer `index` with its feedback message. The correct index
    /// moves down by one if it pointed at or after the removed answer.
    pub(crate) fn remove_answer(&mut self, index: usize) -> EditResult {
        check_index(index, self.answers.len())?;
        if self.answers.len() <= MIN_ANSWERS {
            return Err(RecordEditError::MinimumAnswers);
        }
        self.answers.remove(index);
        if let Some(feedback) = &mut self.feedback_messages {
            if index < feedback.len() {
                feedback.remove(index);
            }
        }
        if self.correct_answer >= index {
            self.correct_answer = self.correct_answer.saturating_sub(1);
        }
        self.normalize();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionEdit {
    SetText(String),
    AddAnswer,
    RemoveAnswer(usize),
    SetAnswer { index: usize, text: String },
    SetCorrectAnswer(usize),
    SetFeedback { index: usize, text: String },
    /// Turns per-answer feedback on (creating blank messages) or off (dropping them).
    EnableFeedback(bool),
}

impl QuestionEdit {
    pub(crate) fn apply(self, record: &mut Question) -> EditResult {
        match self {
            QuestionEdit::SetText(text) => record.text = text,
            QuestionEdit::AddAnswer => {
                record.answers.push(String::new());
                if let Some(feedback) = &mut record.feedback_messages {
                    feedback.push(String::new());
                }
            }
            QuestionEdit::RemoveAnswer(index) => record.remove_answer(index)?,
            QuestionEdit::SetAnswer { index, text } => {
                check_index(index, record.answers.len())?;
                record.answers[index] = text;
            }
            QuestionEdit::SetCorrectAnswer(index) => {
                check_index(index, record.answers.len())?;
                record.correct_answer = index;
            }
            QuestionEdit::SetFeedback { index, text } => {
                check_index(index, record.answers.len())?;
                let len = record.answers.len();
                let feedback = record
                    .feedback_messages
                    .get_or_insert_with(|| vec![String::new(); len]);
                feedback[index] = text;
            }
            QuestionEdit::EnableFeedback(true) => {
                if record.feedback_messages.is_none() {
                    record.feedback_messages = Some(vec![String::new(); record.answers.len()]);
                }
            }
            QuestionEdit::EnableFeedback(false) => record.feedback_messages = None,
        }
        record.normalize();
        Ok(())
    }
}

// --- Submission prompts ---

/// What kind of answer a submission prompt collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "textarea")]
    Textarea,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "websiteInfo")]
    WebsiteInfo,
    #[serde(rename = "multiple_choice")]
    MultipleChoice,
    #[serde(rename = "image")]
    Image,
}

impl MediaType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        serde_json::from_value(Value::String(tag.to_string())).ok()
    }
}

/// A prompt on a submission node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPrompt {
    pub id: String,
    pub text: String,
    pub media_type: MediaType,
    /// Number of list entries; only for `list`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<u32>,
    /// Maximum number of websites; only for `websiteInfo`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    /// Answer options; only for `multiple_choice`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubmissionPrompt {
    pub fn blank() -> Self {
        Self {
            id: new_record_id(),
            text: String::new(),
            media_type: MediaType::Textarea,
            items: None,
            max: None,
            options: None,
            extra: Map::new(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let media_type = match field(value, "mediaType") {
            Value::Null => MediaType::Textarea,
            Value::String(tag) => MediaType::from_tag(tag).unwrap_or_else(|| {
                log::warn!("Coercion fallback for 'submissionPrompt.mediaType': unknown tag '{}'", tag);
                MediaType::Textarea
            }),
            other => {
                log::warn!("Coercion fallback for 'submissionPrompt.mediaType': found {}", other);
                MediaType::Textarea
            }
        };
        let mut prompt = Self {
            id: read_string(field(value, "id"), "submissionPrompt.id"),
            text: read_string(field(value, "text"), "submissionPrompt.text"),
            media_type,
            items: None,
            max: None,
            options: None,
            extra: extra_fields(value, &["id", "text", "mediaType", "items", "max", "options"]),
        };
        match media_type {
            MediaType::List => {
                prompt.items = Some(read_count(field(value, "items"), "submissionPrompt.items").max(1) as u32)
            }
            MediaType::WebsiteInfo => {
                prompt.max = Some(read_count(field(value, "max"), "submissionPrompt.max").max(1) as u32)
            }
            MediaType::MultipleChoice => {
                let mut options = read_string_list(field(value, "options"), "submissionPrompt.options");
                if options.len() < MIN_OPTIONS {
                    options.resize(MIN_OPTIONS, String::new());
                }
                prompt.options = Some(options);
            }
            MediaType::Textarea | MediaType::Image => {}
        }
        prompt
    }

    pub fn to_value(&self) -> Value {
        to_json(self)
    }

    /// Switches the media type, clearing the old variant's fields and
    /// initializing the new variant's defaults.
    pub fn set_media_type(&mut self, media_type: MediaType) {
        if self.media_type == media_type {
            return;
        }
        self.items = None;
        self.max = None;
        self.options = None;
        match media_type {
            MediaType::List => self.items = Some(1),
            MediaType::WebsiteInfo => self.max = Some(5),
            MediaType::MultipleChoice => self.options = Some(vec![String::new(); MIN_OPTIONS]),
            MediaType::Textarea | MediaType::Image => {}
        }
        self.media_type = media_type;
    }

    /// Options that hold text.
    pub fn filled_options(&self) -> usize {
        self.options
            .as_ref()
            .map(|o| o.iter().filter(|s| !s.trim().is_empty()).count())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionPromptEdit {
    SetText(String),
    SetMediaType(MediaType),
    SetItems(u32),
    SetMax(u32),
    AddOption,
    RemoveOption(usize),
    SetOption { index: usize, text: String },
}

impl SubmissionPromptEdit {
    pub(crate) fn apply(self, record: &mut SubmissionPrompt) -> EditResult {
        match self {
            SubmissionPromptEdit::SetText(text) => record.text = text,
            SubmissionPromptEdit::SetMediaType(media_type) => record.set_media_type(media_type),
            SubmissionPromptEdit::SetItems(items) => {
                let slot = record.items.as_mut().ok_or(RecordEditError::Inactive("items"))?;
                *slot = items.max(1);
            }
            SubmissionPromptEdit::SetMax(max) => {
                let slot = record.max.as_mut().ok_or(RecordEditError::Inactive("max"))?;
                *slot = max.max(1);
            }
            SubmissionPromptEdit::AddOption => record
                .options
                .as_mut()
                .ok_or(RecordEditError::Inactive("options"))?
                .push(String::new()),
            SubmissionPromptEdit::RemoveOption(index) => {
                let options = record.options.as_mut().ok_or(RecordEditError::Inactive("options"))?;
                check_index(index, options.len())?;
                if options.len() <= MIN_OPTIONS {
                    return Err(RecordEditError::MinimumOptions);
                }
                options.remove(index);
            }
            SubmissionPromptEdit::SetOption { index, text } => {
                let options = record.options.as_mut().ok_or(RecordEditError::Inactive("options"))?;
                check_index(index, options.len())?;
                options[index] = text;
            }
        }
        Ok(())
    }
}

// --- Live presentation prompts ---

/// How students answer a live prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputConfig {
    #[serde(rename = "type")]
    pub input_type: String,
    pub placeholder: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_type: "text".to_string(),
            placeholder: String::new(),
        }
    }
}

/// One statement of a live presentation, with its optional features.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePrompt {
    pub id: String,
    pub statement: String,
    pub has_input: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_config: Option<InputConfig>,
    /// Shows a random item from a connected list variable.
    pub use_random_list_item: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_variable_id: Option<String>,
    /// Lets students browse a peer's submission.
    pub enable_group_submission_navigation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_prompt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_editing: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LivePrompt {
    pub fn blank() -> Self {
        Self {
            id: new_record_id(),
            statement: String::new(),
            has_input: false,
            input_config: None,
            use_random_list_item: false,
            list_variable_id: None,
            enable_group_submission_navigation: false,
            submission_prompt_id: None,
            allow_editing: None,
            extra: Map::new(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let has_input = read_bool(field(value, "hasInput"), "livePrompt.hasInput");
        let use_random_list_item =
            read_bool(field(value, "useRandomListItem"), "livePrompt.useRandomListItem");
        let navigation = read_bool(
            field(value, "enableGroupSubmissionNavigation"),
            "livePrompt.enableGroupSubmissionNavigation",
        );

        let input_config = has_input.then(|| {
            let config = field(value, "inputConfig");
            let input_type = read_string(field(config, "type"), "livePrompt.inputConfig.type");
            InputConfig {
                input_type: if input_type.is_empty() { "text".to_string() } else { input_type },
                placeholder: read_string(field(config, "placeholder"), "livePrompt.inputConfig.placeholder"),
            }
        });

        Self {
            id: read_string(field(value, "id"), "livePrompt.id"),
            statement: read_string(field(value, "statement"), "livePrompt.statement"),
            has_input,
            input_config,
            use_random_list_item,
            list_variable_id: use_random_list_item
                .then(|| read_optional_string(value.get("listVariableId"), "livePrompt.listVariableId"))
                .flatten(),
            enable_group_submission_navigation: navigation,
            submission_prompt_id: navigation
                .then(|| {
                    read_optional_string(value.get("submissionPromptId"), "livePrompt.submissionPromptId")
                })
                .flatten(),
            allow_editing: navigation
                .then(|| read_bool(field(value, "allowEditing"), "livePrompt.allowEditing")),
            extra: extra_fields(
                value,
                &[
                    "id",
                    "statement",
                    "hasInput",
                    "inputConfig",
                    "useRandomListItem",
                    "listVariableId",
                    "enableGroupSubmissionNavigation",
                    "submissionPromptId",
                    "allowEditing",
                ],
            ),
        }
    }

    pub fn to_value(&self) -> Value {
        to_json(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LivePromptEdit {
    SetStatement(String),
    SetHasInput(bool),
    SetInputType(String),
    SetInputPlaceholder(String),
    SetUseRandomListItem(bool),
    SetListVariable(String),
    SetGroupSubmissionNavigation(bool),
    SetSubmissionPrompt(String),
    SetAllowEditing(bool),
}

impl LivePromptEdit {
    pub(crate) fn apply(self, record: &mut LivePrompt) -> EditResult {
        match self {
            LivePromptEdit::SetStatement(statement) => record.statement = statement,
            LivePromptEdit::SetHasInput(enabled) => {
                record.has_input = enabled;
                if !enabled {
                    record.input_config = None;
                } else if record.input_config.is_none() {
                    record.input_config = Some(InputConfig::default());
                }
            }
            LivePromptEdit::SetInputType(input_type) => {
                record
                    .input_config
                    .as_mut()
                    .ok_or(RecordEditError::Inactive("inputConfig"))?
                    .input_type = input_type;
            }
            LivePromptEdit::SetInputPlaceholder(placeholder) => {
                record
                    .input_config
                    .as_mut()
                    .ok_or(RecordEditError::Inactive("inputConfig"))?
                    .placeholder = placeholder;
            }
            LivePromptEdit::SetUseRandomListItem(enabled) => {
                record.use_random_list_item = enabled;
                if !enabled {
                    record.list_variable_id = None;
                }
            }
            LivePromptEdit::SetListVariable(id) => {
                if !record.use_random_list_item {
                    return Err(RecordEditError::Inactive("listVariableId"));
                }
                record.list_variable_id = Some(id);
            }
            LivePromptEdit::SetGroupSubmissionNavigation(enabled) => {
                record.enable_group_submission_navigation = enabled;
                if enabled {
                    record.allow_editing.get_or_insert(false);
                } else {
                    record.submission_prompt_id = None;
                    record.allow_editing = None;
                }
            }
            LivePromptEdit::SetSubmissionPrompt(id) => {
                if !record.enable_group_submission_navigation {
                    return Err(RecordEditError::Inactive("submissionPromptId"));
                }
                record.submission_prompt_id = Some(id);
            }
            LivePromptEdit::SetAllowEditing(allow) => {
                if !record.enable_group_submission_navigation {
                    return Err(RecordEditError::Inactive("allowEditing"));
                }
                record.allow_editing = Some(allow);
            }
        }
        Ok(())
    }
}

// --- Variables ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Text,
    Group,
    List,
}

/// A global variable. Only `list` variables carry items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub variable_type: VariableType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Variable {
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            variable_type: VariableType::Text,
            items: None,
            extra: Map::new(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let variable_type = serde_json::from_value(field(value, "type").clone()).unwrap_or_else(|_| {
            if !field(value, "type").is_null() {
                log::warn!("Coercion fallback for 'variable.type': found {}", field(value, "type"));
            }
            VariableType::Text
        });
        Self {
            name: read_string(field(value, "name"), "variable.name"),
            variable_type,
            items: (variable_type == VariableType::List)
                .then(|| read_string_list(field(value, "items"), "variable.items")),
            extra: extra_fields(value, &["name", "type", "items"]),
        }
    }

    pub fn to_value(&self) -> Value {
        to_json(self)
    }

    pub fn set_type(&mut self, variable_type: VariableType) {
        if self.variable_type == variable_type {
            return;
        }
        self.variable_type = variable_type;
        self.items = (variable_type == VariableType::List).then(Vec::new);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariableEdit {
    SetName(String),
    SetType(VariableType),
    AddItem(String),
    SetItem { index: usize, text: String },
    RemoveItem(usize),
}

impl VariableEdit {
    pub(crate) fn apply(self, record: &mut Variable) -> EditResult {
        match self {
            VariableEdit::SetName(name) => record.name = name,
            VariableEdit::SetType(variable_type) => record.set_type(variable_type),
            VariableEdit::AddItem(text) => record
                .items
                .as_mut()
                .ok_or(RecordEditError::Inactive("items"))?
                .push(text),
            VariableEdit::SetItem { index, text } => {
                let items = record.items.as_mut().ok_or(RecordEditError::Inactive("items"))?;
                check_index(index, items.len())?;
                items[index] = text;
            }
            VariableEdit::RemoveItem(index) => {
                let items = record.items.as_mut().ok_or(RecordEditError::Inactive("items"))?;
                check_index(index, items.len())?;
                items.remove(index);
            }
        }
        Ok(())
    }
}

/// An edit to one record of a record-list property.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEdit {
    TestCase(TestCaseEdit),
    Question(QuestionEdit),
    SubmissionPrompt(SubmissionPromptEdit),
    LivePrompt(LivePromptEdit),
    Variable(VariableEdit),
}

impl From<TestCaseEdit> for RecordEdit {
    fn from(edit: TestCaseEdit) -> Self {
        RecordEdit::TestCase(edit)
    }
}

impl From<QuestionEdit> for RecordEdit {
    fn from(edit: QuestionEdit) -> Self {
        RecordEdit::Question(edit)
    }
}

impl From<SubmissionPromptEdit> for RecordEdit {
    fn from(edit: SubmissionPromptEdit) -> Self {
        RecordEdit::SubmissionPrompt(edit)
    }
}

impl From<LivePromptEdit> for RecordEdit {
    fn from(edit: LivePromptEdit) -> Self {
        RecordEdit::LivePrompt(edit)
    }
}

impl From<VariableEdit> for RecordEdit {
    fn from(edit: VariableEdit) -> Self {
        RecordEdit::Variable(edit)
    }
}
