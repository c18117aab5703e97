//! Lenient readers for stored values.
//!
//! Data bags may predate the schema that reads them. Every reader here returns
//! a usable value instead of failing, and logs a coercion fallback when it had
//! to discard what was stored. `null` counts as "not set" and is not logged.

use super::fields::handler_for;
use super::sync::MAX_DERIVED_LENGTH;
use crate::schema::{PropertyDefinition, PropertyType};
use serde_json::{Value, json};

fn fallback(context: &str, expected: &str, found: &Value) {
    log::warn!(
        "Coercion fallback for '{}': expected {}, found {}",
        context,
        expected,
        found
    );
}

pub(crate) fn read_i64(value: &Value, context: &str) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f.trunc() as i64).unwrap_or_else(|_| {
            fallback(context, "an integer", value);
            0
        }),
        Value::Bool(b) => *b as i64,
        Value::Null => 0,
        other => {
            fallback(context, "an integer", other);
            0
        }
    }
}

/// Reads a count. Negative counts clamp to zero.
pub(crate) fn read_count(value: &Value, context: &str) -> usize {
    read_i64(value, context).max(0) as usize
}

/// Reads the count that sizes a derived list, within `0..=MAX_DERIVED_LENGTH`.
pub(crate) fn read_length(value: &Value, context: &str) -> usize {
    read_count(value, context).min(MAX_DERIVED_LENGTH)
}

pub(crate) fn read_f64(value: &Value, context: &str) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or_else(|_| {
            fallback(context, "a number", value);
            0.0
        }),
        Value::Bool(b) => *b as i64 as f64,
        Value::Null => 0.0,
        other => {
            fallback(context, "a number", other);
            0.0
        }
    }
}

pub(crate) fn read_bool(value: &Value, context: &str) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => match s.as_str() {
            "true" => true,
            "false" | "" => false,
            _ => {
                fallback(context, "a boolean", value);
                false
            }
        },
        Value::Null => false,
        other => {
            fallback(context, "a boolean", other);
            false
        }
    }
}

pub(crate) fn read_string(value: &Value, context: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => {
            fallback(context, "a string", other);
            String::new()
        }
    }
}

pub(crate) fn read_optional_string(value: Option<&Value>, context: &str) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(read_string(v, context)),
    }
}

/// Reads an array, keeping elements as stored.
pub(crate) fn read_array(value: &Value, context: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => {
            fallback(context, "a list", other);
            Vec::new()
        }
    }
}

pub(crate) fn read_string_list(value: &Value, context: &str) -> Vec<String> {
    read_array(value, context)
        .iter()
        .map(|item| read_string(item, context))
        .collect()
}

/// Whether `value` has the JSON shape `property` stores.
fn has_expected_shape(property: &PropertyDefinition, value: &Value) -> bool {
    match property.property_type {
        PropertyType::Number => value.is_i64(),
        PropertyType::Range => value.is_number(),
        PropertyType::Checkbox => value.is_boolean(),
        PropertyType::Hidden => true,
        t if t.is_list() => value.is_array(),
        _ => value.is_string(),
    }
}

/// Brings a stored value into the shape its property type expects.
///
/// Values that are close enough (a numeric string for a number, a number for
/// a text) are converted; anything else is replaced by the type's zero value.
/// `Number` values are integers, fractions truncate toward zero.
pub(crate) fn coerce_value(property: &PropertyDefinition, value: &Value) -> Value {
    if has_expected_shape(property, value) {
        return value.clone();
    }
    let context = property.key.as_str();
    match property.property_type {
        PropertyType::Number => json!(read_i64(value, context)),
        PropertyType::Range => json!(read_f64(value, context)),
        PropertyType::Checkbox => Value::Bool(read_bool(value, context)),
        PropertyType::Text
        | PropertyType::TextArea
        | PropertyType::Select
        | PropertyType::Radio
            if matches!(value, Value::Number(_) | Value::Bool(_) | Value::Null) =>
        {
            Value::String(read_string(value, context))
        }
        _ => {
            if !value.is_null() {
                fallback(context, property.property_type.tag(), value);
            }
            (handler_for(property.property_type).default_for)(property)
        }
    }
}
