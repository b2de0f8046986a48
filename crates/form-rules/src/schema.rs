use schemars::schema_for;
use serde_json::Value;

use crate::model::{Condition, Field};

/// JSON Schema for a persisted condition array.
pub fn conditions_schema() -> Value {
    serde_json::to_value(schema_for!(Vec<Condition>)).unwrap_or(Value::Null)
}

/// JSON Schema for a persisted field array.
pub fn fields_schema() -> Value {
    serde_json::to_value(schema_for!(Vec<Field>)).unwrap_or(Value::Null)
}
