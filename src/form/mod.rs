//! The generic settings form.
//!
//! A [`SettingsForm`] edits a draft copy of one node's data bag, driven
//! entirely by the node type's schema. Every edit either applies completely,
//! including count-derived list resizes, or is rejected with the draft left
//! untouched. Nothing leaves the form until it is saved.

use crate::data::DataBag;
use crate::error::{FormError, ValidationWarning};
use crate::graph::WorkflowGraph;
use crate::registry::NodeTypeRegistry;
use crate::schema::{NodeSchema, PropertyDefinition, PropertyType};
use serde_json::Value;

mod coerce;
pub mod fields;
pub mod records;
pub mod selectors;
mod sync;
pub mod upload;
pub mod view;

pub use fields::{Control, ControlEvent, FieldContext, FieldHandler, handler_for};
pub use records::{
    InputConfig, LivePrompt, LivePromptEdit, MIN_ANSWERS, MIN_OPTIONS, MediaType, Question, QuestionEdit,
    RecordEdit, SubmissionPrompt, SubmissionPromptEdit, TestCase, TestCaseEdit, Variable, VariableEdit,
    VariableType,
};
pub use selectors::{GraphOptions, SelectorOption, collect_options};
pub use sync::MAX_DERIVED_LENGTH;
pub use upload::{AssetApi, AssetDescriptor, AssetKind, UploadFile};
pub use view::{FormAction, FormView, RenderedField};

use coerce::{read_array, read_length};
use records::RecordEditError;
use sync::{has_derived_length, resize_dependent};

/// Message shown in place of the form for unknown node types.
pub const FALLBACK_MESSAGE: &str = "Settings not available";

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Initializing,
    Editing,
    Saved,
    Cancelled,
    /// The node type is unknown; only closing is possible.
    Unavailable,
}

/// Callbacks into the editor shell that opened the form.
pub trait FormHost {
    fn on_save(&mut self, node_id: &str, data: DataBag);
    fn on_close(&mut self, node_id: &str);
}

impl FormHost for WorkflowGraph {
    fn on_save(&mut self, node_id: &str, data: DataBag) {
        if !self.replace_node_data(node_id, data) {
            log::warn!("Saved settings for node '{}', which is no longer in the workflow", node_id);
        }
    }

    fn on_close(&mut self, _node_id: &str) {}
}

/// An open settings form for a single node.
#[derive(Debug)]
pub struct SettingsForm<'r> {
    registry: &'r NodeTypeRegistry,
    node_id: String,
    node_type: String,
    schema: Option<&'r NodeSchema>,
    draft: DataBag,
    state: FormState,
    inline_error: Option<String>,
}

impl<'r> SettingsForm<'r> {
    /// Opens a form over `current`.
    ///
    /// The draft holds every schema property in schema order, taken from
    /// `current` where set and from the property default otherwise. Unknown
    /// node types open in the [`FormState::Unavailable`] state.
    pub fn open(registry: &'r NodeTypeRegistry, node_id: &str, type_id: &str, current: &DataBag) -> Self {
        let mut form = Self {
            registry,
            node_id: node_id.to_string(),
            node_type: type_id.to_string(),
            schema: None,
            draft: DataBag::new(),
            state: FormState::Initializing,
            inline_error: None,
        };

        let schema = match registry.schema(type_id) {
            Ok(schema) => schema,
            Err(error) => {
                log::warn!("Cannot edit node '{}': {}", node_id, error);
                form.state = FormState::Unavailable;
                return form;
            }
        };

        form.draft = schema
            .properties
            .iter()
            .map(|p| {
                let value = current
                    .get(&p.key)
                    .filter(|v| !v.is_null())
                    .cloned()
                    .unwrap_or_else(|| p.default_value());
                (p.key.clone(), value)
            })
            .collect();
        for key in current.keys().filter(|k| schema.property(k).is_none()) {
            log::debug!("Dropping '{}' from node '{}': not part of the {} schema", key, node_id, type_id);
        }

        form.schema = Some(schema);
        form.state = FormState::Editing;
        log::debug!("Opened settings for node '{}' ({})", node_id, type_id);
        form
    }

    /// Opens a form for a node of `graph`. Returns `None` if the node does not exist.
    pub fn open_node(registry: &'r NodeTypeRegistry, graph: &WorkflowGraph, node_id: &str) -> Option<Self> {
        graph
            .node(node_id)
            .map(|node| Self::open(registry, &node.id, &node.node_type, &node.data))
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn schema(&self) -> Option<&'r NodeSchema> {
        self.schema
    }

    /// The draft as stored, without coercion.
    pub fn draft(&self) -> &DataBag {
        &self.draft
    }

    /// The value of a property, coerced to its type. `None` for unknown keys.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.property(key).ok().map(|p| self.current_value(p))
    }

    /// The message of the last failed upstream request, until dismissed.
    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.inline_error = None;
    }

    pub fn actions(&self) -> Vec<FormAction> {
        match self.state {
            FormState::Editing => vec![FormAction::Save, FormAction::Close],
            _ => vec![FormAction::Close],
        }
    }

    fn ensure_editing(&self) -> Result<(), FormError> {
        match self.state {
            FormState::Editing => Ok(()),
            FormState::Unavailable => Err(FormError::Unavailable),
            FormState::Initializing | FormState::Saved | FormState::Cancelled => Err(FormError::Closed),
        }
    }

    fn property(&self, key: &str) -> Result<&'r PropertyDefinition, FormError> {
        let schema = self.schema.ok_or(FormError::Unavailable)?;
        schema
            .property(key)
            .ok_or_else(|| FormError::UnknownProperty(key.to_string()))
    }

    fn current_value(&self, property: &PropertyDefinition) -> Value {
        coerce::coerce_value(property, self.draft.get(&property.key).unwrap_or(&NULL))
    }

    fn unsupported(property: &PropertyDefinition, operation: &'static str) -> FormError {
        FormError::UnsupportedOperation {
            key: property.key.clone(),
            property_type: property.property_type,
            operation,
        }
    }

    /// The derived length of `property`, if it has a count key.
    fn derived_length(&self, property: &PropertyDefinition) -> Option<usize> {
        let count_key = property.count_key.as_deref()?;
        let count = self.property(count_key).ok()?;
        Some(read_length(&self.current_value(count), count_key))
    }

    fn clamp_number(property: &PropertyDefinition, value: Value) -> Value {
        let Some(number) = value.as_f64() else {
            return value;
        };
        let clamped = property.min.map_or(number, |min| number.max(min));
        let clamped = property.max.map_or(clamped, |max| clamped.min(max));
        if clamped == number {
            value
        } else if property.property_type == PropertyType::Number {
            Value::from(clamped as i64)
        } else {
            Value::from(clamped)
        }
    }

    /// Sets a property and re-establishes the lengths of every list derived from it.
    ///
    /// A count that sizes other lists is stored within `0..=MAX_DERIVED_LENGTH`.
    /// Setting a property to its current value changes nothing.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.property(key)?;
        let schema = self.schema.ok_or(FormError::Unavailable)?;

        let mut new_value = coerce::coerce_value(property, &value);
        if matches!(property.property_type, PropertyType::Number | PropertyType::Range) {
            new_value = Self::clamp_number(property, new_value);
        }
        if schema.dependents_of(key).next().is_some() {
            new_value = Value::from(read_length(&new_value, key));
        }
        if let Some(target) = self.derived_length(property) {
            if !has_derived_length(property, &new_value, target) {
                new_value = resize_dependent(property, &new_value, target);
            }
        }
        if self.draft.get(key) == Some(&new_value) {
            return Ok(());
        }

        let mut changes = vec![(key.to_string(), new_value)];
        for dependent in schema.dependents_of(key) {
            let target = read_length(&changes[0].1, key);
            let current = self.current_value(dependent);
            if !has_derived_length(dependent, &current, target) {
                changes.push((dependent.key.clone(), resize_dependent(dependent, &current, target)));
            }
        }
        for (key, value) in changes {
            self.draft.insert(key, value);
        }
        Ok(())
    }

    /// Feeds a raw control event through the property's field handler.
    pub fn apply_event(&mut self, key: &str, event: ControlEvent) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.property(key)?;
        let current = self.current_value(property);
        match (handler_for(property.property_type).parse_event)(property, &current, event) {
            Some(value) => self.set_field(key, value),
            None => Err(Self::unsupported(property, "apply_event")),
        }
    }

    /// Replaces one slot of a dynamic text list.
    pub fn set_list_item(&mut self, key: &str, index: usize, text: &str) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.property(key)?;
        if property.property_type != PropertyType::DynamicTextList {
            return Err(Self::unsupported(property, "set_list_item"));
        }
        let mut items = read_array(&self.current_value(property), key);
        let len = items.len();
        let slot = items.get_mut(index).ok_or_else(|| FormError::IndexOutOfRange {
            key: key.to_string(),
            index,
            len,
        })?;
        *slot = Value::String(text.to_string());
        self.draft.insert(key, Value::Array(items));
        Ok(())
    }

    /// Appends a blank record (or a blank entry to a free-length text list).
    pub fn push_record(&mut self, key: &str) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.property(key)?;
        let entry = match property.property_type {
            PropertyType::TestCases => TestCase::blank(self.derived_length(property).unwrap_or(0)).to_value(),
            PropertyType::MultipleChoiceQuestions => Question::blank().to_value(),
            PropertyType::SubmissionPrompts => SubmissionPrompt::blank().to_value(),
            PropertyType::LivePresentationPrompts => LivePrompt::blank().to_value(),
            PropertyType::Variables => Variable::blank().to_value(),
            PropertyType::DynamicTextList if property.count_key.is_none() => Value::String(String::new()),
            _ => return Err(Self::unsupported(property, "push_record")),
        };
        let mut items = read_array(&self.current_value(property), key);
        items.push(entry);
        self.draft.insert(key, Value::Array(items));
        Ok(())
    }

    pub fn remove_record(&mut self, key: &str, index: usize) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.property(key)?;
        let removable = property.property_type.is_record_list()
            || (property.property_type == PropertyType::DynamicTextList && property.count_key.is_none());
        if !removable {
            return Err(Self::unsupported(property, "remove_record"));
        }
        let mut items = read_array(&self.current_value(property), key);
        if index >= items.len() {
            return Err(FormError::IndexOutOfRange {
                key: key.to_string(),
                index,
                len: items.len(),
            });
        }
        items.remove(index);
        self.draft.insert(key, Value::Array(items));
        Ok(())
    }

    /// Applies a structured edit to record `index` of a record-list property.
    pub fn edit_record(&mut self, key: &str, index: usize, edit: impl Into<RecordEdit>) -> Result<(), FormError> {
        self.ensure_editing()?;
        let property = self.property(key)?;
        let mut items = read_array(&self.current_value(property), key);
        let len = items.len();
        let stored = items.get(index).ok_or_else(|| FormError::IndexOutOfRange {
            key: key.to_string(),
            index,
            len,
        })?;

        let result = match (property.property_type, edit.into()) {
            (PropertyType::TestCases, RecordEdit::TestCase(edit)) => {
                let mut record = TestCase::from_value(stored);
                edit.apply(&mut record).map(|_| record.to_value())
            }
            (PropertyType::MultipleChoiceQuestions, RecordEdit::Question(edit)) => {
                let mut record = Question::from_value(stored);
                edit.apply(&mut record).map(|_| record.to_value())
            }
            (PropertyType::SubmissionPrompts, RecordEdit::SubmissionPrompt(edit)) => {
                let mut record = SubmissionPrompt::from_value(stored);
                edit.apply(&mut record).map(|_| record.to_value())
            }
            (PropertyType::LivePresentationPrompts, RecordEdit::LivePrompt(edit)) => {
                let mut record = LivePrompt::from_value(stored);
                edit.apply(&mut record).map(|_| record.to_value())
            }
            (PropertyType::Variables, RecordEdit::Variable(edit)) => {
                let mut record = Variable::from_value(stored);
                edit.apply(&mut record).map(|_| record.to_value())
            }
            _ => Err(RecordEditError::WrongRecordType),
        };

        let updated = result.map_err(|error| match error {
            RecordEditError::IndexOutOfRange { index, len } => FormError::IndexOutOfRange {
                key: key.to_string(),
                index,
                len,
            },
            RecordEditError::MinimumAnswers => FormError::MinimumAnswers { minimum: MIN_ANSWERS },
            RecordEditError::MinimumOptions => FormError::MinimumOptions { minimum: MIN_OPTIONS },
            RecordEditError::Inactive(field) => FormError::InactiveField {
                key: key.to_string(),
                index,
                field,
            },
            RecordEditError::WrongRecordType => Self::unsupported(property, "edit_record"),
        })?;
        items[index] = updated;
        self.draft.insert(key, Value::Array(items));
        Ok(())
    }

    fn is_visible(&self, property: &PropertyDefinition) -> bool {
        property.property_type != PropertyType::Hidden
            && property.visible_when.iter().all(|condition| {
                let actual = match self.property(&condition.key) {
                    Ok(controller) => self.current_value(controller),
                    Err(_) => self.draft.get(&condition.key).cloned().unwrap_or(Value::Null),
                };
                actual == condition.equals
            })
    }

    /// Properties currently shown, in schema order. Recomputed from the draft on every call.
    pub fn visible_properties(&self) -> Vec<&'r PropertyDefinition> {
        self.schema
            .map(|schema| schema.properties.iter().filter(|p| self.is_visible(p)).collect())
            .unwrap_or_default()
    }

    /// Inline problems with the visible part of the draft.
    pub fn warnings(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        for property in self.visible_properties() {
            let key = property.key.as_str();
            let warn = |index: usize, message: &str, blocking: bool| ValidationWarning {
                key: key.to_string(),
                index: Some(index),
                message: message.to_string(),
                blocking,
            };
            let records = read_array(&self.current_value(property), key);
            match property.property_type {
                PropertyType::MultipleChoiceQuestions => {
                    for (index, question) in records.iter().map(Question::from_value).enumerate() {
                        if question.answers.len() < MIN_ANSWERS {
                            warnings.push(warn(index, "A question needs at least 2 answers", true));
                        }
                        if question.text.trim().is_empty() {
                            warnings.push(warn(index, "Question text is empty", false));
                        }
                    }
                }
                PropertyType::SubmissionPrompts => {
                    for (index, prompt) in records.iter().map(SubmissionPrompt::from_value).enumerate() {
                        if prompt.media_type == MediaType::MultipleChoice && prompt.filled_options() < MIN_OPTIONS {
                            warnings.push(warn(index, "Multiple choice needs at least 2 non-empty options", true));
                        }
                    }
                }
                PropertyType::LivePresentationPrompts => {
                    for (index, prompt) in records.iter().map(LivePrompt::from_value).enumerate() {
                        if prompt.use_random_list_item && prompt.list_variable_id.is_none() {
                            warnings.push(warn(index, "No list variable selected", false));
                        }
                        if prompt.enable_group_submission_navigation && prompt.submission_prompt_id.is_none() {
                            warnings.push(warn(index, "No submission prompt selected", false));
                        }
                    }
                }
                PropertyType::Variables => {
                    for (index, variable) in records.iter().map(Variable::from_value).enumerate() {
                        if variable.name.trim().is_empty() {
                            warnings.push(warn(index, "Variable has no name", false));
                        }
                    }
                }
                _ => {}
            }
        }
        warnings
    }

    /// Renders the visible fields, with selector options scanned from `graph`.
    pub fn render(&self, graph: &WorkflowGraph) -> FormView {
        let schema = match (self.state, self.schema) {
            (FormState::Unavailable, _) | (_, None) => {
                return FormView::Fallback {
                    message: FALLBACK_MESSAGE.to_string(),
                    actions: vec![FormAction::Close],
                };
            }
            (_, Some(schema)) => schema,
        };

        let options = collect_options(self.registry, graph, &self.node_id);
        let fields = self
            .visible_properties()
            .into_iter()
            .map(|property| {
                let value = self.current_value(property);
                let context = FieldContext {
                    property,
                    value: &value,
                    draft: &self.draft,
                    options: &options,
                };
                RenderedField {
                    key: property.key.clone(),
                    label: property.label.clone(),
                    control: (handler_for(property.property_type).render)(&context),
                }
            })
            .collect();

        FormView::Form {
            title: schema.display_name.clone(),
            fields,
            warnings: self.warnings(),
            error: self.inline_error.clone(),
            actions: self.actions(),
        }
    }

    /// Finalizes the form and returns the draft.
    ///
    /// Refused while any blocking warning is present; the form stays open.
    pub fn save(&mut self) -> Result<DataBag, FormError> {
        self.ensure_editing()?;
        let blocking: Vec<String> = self
            .warnings()
            .into_iter()
            .filter(|w| w.blocking)
            .map(|w| w.to_string())
            .collect();
        if !blocking.is_empty() {
            return Err(FormError::SaveBlocked(blocking.join("; ")));
        }
        self.state = FormState::Saved;
        log::debug!("Saved settings for node '{}'", self.node_id);
        Ok(self.draft.clone())
    }

    /// Saves and hands the data to the host.
    pub fn submit(&mut self, host: &mut impl FormHost) -> Result<(), FormError> {
        let data = self.save()?;
        host.on_save(&self.node_id, data);
        Ok(())
    }

    /// Discards the draft without saving.
    pub fn close(&mut self, host: &mut impl FormHost) -> Result<(), FormError> {
        if matches!(self.state, FormState::Saved | FormState::Cancelled) {
            return Err(FormError::Closed);
        }
        self.state = FormState::Cancelled;
        self.draft = DataBag::new();
        log::debug!("Closed settings for node '{}'", self.node_id);
        host.on_close(&self.node_id);
        Ok(())
    }
}
