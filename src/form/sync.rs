//! Keeps count-derived list lengths in step with their count property.

use super::coerce::read_array;
use super::records::{LivePrompt, Question, SubmissionPrompt, TestCase, Variable};
use crate::schema::{PropertyDefinition, PropertyType};
use serde_json::Value;

/// Longest list a count property can derive. Larger counts are stored as this value.
pub const MAX_DERIVED_LENGTH: usize = 256;

/// The entry appended when a derived list grows.
fn empty_entry(property_type: PropertyType) -> Value {
    match property_type {
        PropertyType::MultipleChoiceQuestions => Question::blank().to_value(),
        PropertyType::SubmissionPrompts => SubmissionPrompt::blank().to_value(),
        PropertyType::LivePresentationPrompts => LivePrompt::blank().to_value(),
        PropertyType::Variables => Variable::blank().to_value(),
        _ => Value::String(String::new()),
    }
}

fn resize_padded(mut items: Vec<Value>, target: usize, pad: impl Fn() -> Value) -> Vec<Value> {
    if items.len() > target {
        items.truncate(target);
    } else {
        while items.len() < target {
            items.push(pad());
        }
    }
    items
}

/// Resizes one test case's parameter array, leaving its other fields alone.
fn resize_parameters(record: Value, target: usize) -> Value {
    match record {
        Value::Object(mut object) => {
            let parameters = object.remove("parameters").unwrap_or(Value::Null);
            let parameters = resize_padded(read_array(&parameters, "testCase.parameters"), target, || {
                Value::String(String::new())
            });
            object.insert("parameters".to_string(), Value::Array(parameters));
            Value::Object(object)
        }
        other => {
            log::warn!("Coercion fallback for 'testCase': expected an object, found {}", other);
            TestCase::blank(target).to_value()
        }
    }
}

/// Returns `current` resized so its derived length equals `target`.
///
/// Lists grow and shrink at the tail; surviving entries keep their values and
/// order. Test-case lists resize each record's `parameters` instead of the
/// outer list.
pub(crate) fn resize_dependent(property: &PropertyDefinition, current: &Value, target: usize) -> Value {
    let items = read_array(current, &property.key);
    log::debug!("Resizing '{}' from {} to {}", property.key, items.len(), target);
    let resized = match property.property_type {
        PropertyType::TestCases => items
            .into_iter()
            .map(|record| resize_parameters(record, target))
            .collect(),
        t => resize_padded(items, target, || empty_entry(t)),
    };
    Value::Array(resized)
}

/// Whether `value` already satisfies the derived length `target`.
pub(crate) fn has_derived_length(property: &PropertyDefinition, value: &Value, target: usize) -> bool {
    let Some(items) = value.as_array() else {
        return false;
    };
    match property.property_type {
        PropertyType::TestCases => items.iter().all(|record| {
            record
                .get("parameters")
                .and_then(Value::as_array)
                .is_some_and(|p| p.len() == target)
        }),
        _ => items.len() == target,
    }
}
