use std::cmp::Ordering;

use serde_json::Value;

use crate::model::Operator;

/// Evaluates the trigger triple against the live value map.
///
/// Never fails: operands that cannot be coerced for the requested comparison
/// make the predicate false rather than erroring out, so one bad rule cannot
/// take down the rest of the evaluation pass.
pub fn eval_predicate(
    if_field: &str,
    operator: Operator,
    value: Option<&Value>,
    current_values: &Value,
) -> bool {
    let current = current_values.get(if_field);
    match operator {
        Operator::IsNull => is_empty(current),
        Operator::IsNotNull => !is_empty(current),
        Operator::Equals => match (current, value) {
            (Some(current), Some(expected)) => loose_eq(current, expected),
            _ => false,
        },
        Operator::NotEquals => match (current, value) {
            (Some(current), Some(expected)) => !loose_eq(current, expected),
            (None, Some(_)) => true,
            _ => false,
        },
        Operator::Contains => substring_match(current, value),
        Operator::DoesNotContain => !substring_match(current, value),
        Operator::GreaterThan => ordering_match(current, value, |ord| ord == Ordering::Greater),
        Operator::GreaterThanOrEqual => ordering_match(current, value, |ord| ord != Ordering::Less),
        Operator::SmallerThan => ordering_match(current, value, |ord| ord == Ordering::Less),
        Operator::SmallerThanOrEqual => {
            ordering_match(current, value, |ord| ord != Ordering::Greater)
        }
    }
}

/// Null, absent, and the empty string all count as unanswered.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Loose equality as the source records store it: identical JSON values, or
/// identical string coercions (`"5"` equals `5`, `true` equals `"true"`).
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    left == right || coerce_string(left) == coerce_string(right)
}

pub(crate) fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn substring_match(current: Option<&Value>, value: Option<&Value>) -> bool {
    match (current, value) {
        (Some(current), Some(needle)) => {
            coerce_string(current).contains(&coerce_string(needle))
        }
        _ => false,
    }
}

fn ordering_match(
    current: Option<&Value>,
    value: Option<&Value>,
    accept: impl Fn(Ordering) -> bool,
) -> bool {
    match (current, value) {
        (Some(current), Some(expected)) => compare(current, expected).is_some_and(accept),
        _ => false,
    }
}

/// Numeric comparison first, temporal second; `None` when neither coercion
/// applies to both operands.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (temporal_key(left), temporal_key(right)) {
        return Some(a.cmp(&b));
    }
    None
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Chronological sort key for ISO-style `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]`
/// and `HH:MM[:SS]` strings. Time-only values sort within day zero.
pub(crate) fn temporal_key(value: &Value) -> Option<[u32; 6]> {
    let text = value.as_str()?.trim();
    if let Some((date, time)) = text.split_once(['T', ' ']) {
        let [year, month, day] = date_parts(date)?;
        let [hour, minute, second] = time_parts(time)?;
        Some([year, month, day, hour, minute, second])
    } else if text.contains('-') {
        let [year, month, day] = date_parts(text)?;
        Some([year, month, day, 0, 0, 0])
    } else if text.contains(':') {
        let [hour, minute, second] = time_parts(text)?;
        Some([0, 0, 0, hour, minute, second])
    } else {
        None
    }
}

fn date_parts(text: &str) -> Option<[u32; 3]> {
    let mut parts = text.splitn(3, '-');
    let year = parts.next()?.parse::<u32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    if (1..=12).contains(&month) && (1..=31).contains(&day) {
        Some([year, month, day])
    } else {
        None
    }
}

fn time_parts(text: &str) -> Option<[u32; 3]> {
    let mut parts = text.splitn(3, ':');
    let hour = parts.next()?.parse::<u32>().ok()?;
    let minute = parts.next()?.parse::<u32>().ok()?;
    let second = match parts.next() {
        Some(raw) => raw.parse::<u32>().ok()?,
        None => 0,
    };
    if hour < 24 && minute < 60 && second < 60 {
        Some([hour, minute, second])
    } else {
        None
    }
}
