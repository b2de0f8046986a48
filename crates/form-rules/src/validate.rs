use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::evaluate::{FieldState, evaluate};
use crate::model::{Condition, Field, FieldType, PageId};
use crate::predicate::{coerce_string, is_empty, temporal_key};

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub missing_required: Vec<String>,
    pub unknown_fields: Vec<String>,
}

/// Validates submitted values against the *effective* render state, not the
/// design-time flags: hidden and disabled fields are never validated (a field
/// on a hidden page counts as hidden), a conditionally-required field is
/// checked only when the rule fired, and choice values are checked against
/// the dependent-narrowed option list.
pub fn validate(
    fields: &[Field],
    conditions: &[Condition],
    values: &Value,
    current_page: PageId,
) -> ValidationResult {
    let state = evaluate(fields, conditions, values, current_page);
    let values_map = values.as_object().cloned().unwrap_or_default();

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for field in fields {
        if field.field_type.is_static() {
            continue;
        }
        if state.is_page_hidden(PageId::new(field.page)) {
            continue;
        }
        let Some(field_state) = state.field(&field.key) else {
            continue;
        };
        if !field_state.visible || !field_state.enabled {
            continue;
        }

        let current = values_map.get(&field.key);
        if is_empty(current) {
            if field_state.required {
                missing_required.push(field.key.clone());
            }
            continue;
        }
        if let Some(value) = current
            && let Some(error) = validate_value(field, field_state, value)
        {
            errors.push(error);
        }
    }

    let known: BTreeSet<&str> = fields.iter().map(|field| field.key.as_str()).collect();
    let unknown_fields: Vec<String> = values_map
        .keys()
        .filter(|key| !known.contains(key.as_str()))
        .cloned()
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

fn validate_value(field: &Field, state: &FieldState, value: &Value) -> Option<ValidationError> {
    if field.field_type.is_numeric() && as_number(value).is_none() {
        return Some(error(field, "expected a numeric value", "type_mismatch"));
    }

    if field.field_type.is_temporal() && temporal_key(value).is_none() {
        return Some(error(field, "expected a date or time value", "type_mismatch"));
    }

    if matches!(field.field_type, FieldType::Email) {
        let text = coerce_string(value);
        if !text.contains('@') || text.starts_with('@') || text.ends_with('@') {
            return Some(error(field, "invalid email address", "invalid_email"));
        }
    }

    if field.field_type.is_choice()
        && !state.options.is_empty()
        && !chosen_options_allowed(value, &state.options)
    {
        return Some(error(
            field,
            "value is not one of the allowed options",
            "option_mismatch",
        ));
    }

    if let Some(mask) = &state.mask
        && !mask.matches(&coerce_string(value))
    {
        return Some(error(
            field,
            "value does not conform to the input mask",
            "mask_mismatch",
        ));
    }

    if let Some(pattern) = &field.properties.pattern
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(&coerce_string(value))
    {
        return Some(error(
            field,
            "value does not match pattern",
            "pattern_mismatch",
        ));
    }

    None
}

/// Checkboxes submit arrays; radios and dropdowns submit a single value.
/// Every chosen entry must be in the effective option list.
fn chosen_options_allowed(value: &Value, options: &[String]) -> bool {
    match value {
        Value::Array(entries) => entries
            .iter()
            .all(|entry| options.contains(&coerce_string(entry))),
        other => options.contains(&coerce_string(other)),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn error(field: &Field, message: &str, code: &str) -> ValidationError {
    ValidationError {
        field: field.key.clone(),
        message: message.into(),
        code: code.into(),
    }
}
