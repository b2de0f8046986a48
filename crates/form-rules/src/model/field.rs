use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::condition::Operator;

/// Catalogue of input types a form designer can place on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    ShortText,
    LongText,
    Number,
    Price,
    Email,
    Phone,
    Date,
    DateTime,
    Time,
    Checkbox,
    Radio,
    Dropdown,
    FileUpload,
    ImageUploader,
    Signature,
    Terms,
    Address,
    FullName,
    Link,
    Section,
    Header,
    Divider,
    DisplayText,
    Rating,
    ScaleRating,
    FormCalculation,
    Toggle,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::ShortText => "shorttext",
            FieldType::LongText => "longtext",
            FieldType::Number => "number",
            FieldType::Price => "price",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Time => "time",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Dropdown => "dropdown",
            FieldType::FileUpload => "fileupload",
            FieldType::ImageUploader => "imageuploader",
            FieldType::Signature => "signature",
            FieldType::Terms => "terms",
            FieldType::Address => "address",
            FieldType::FullName => "fullname",
            FieldType::Link => "link",
            FieldType::Section => "section",
            FieldType::Header => "header",
            FieldType::Divider => "divider",
            FieldType::DisplayText => "displaytext",
            FieldType::Rating => "rating",
            FieldType::ScaleRating => "scalerating",
            FieldType::FormCalculation => "formcalculation",
            FieldType::Toggle => "toggle",
        }
    }

    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            FieldType::ShortText
                | FieldType::LongText
                | FieldType::Email
                | FieldType::Phone
                | FieldType::Address
                | FieldType::FullName
                | FieldType::Link
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Number
                | FieldType::Price
                | FieldType::Rating
                | FieldType::ScaleRating
                | FieldType::FormCalculation
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::DateTime | FieldType::Time)
    }

    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldType::Checkbox | FieldType::Radio | FieldType::Dropdown
        )
    }

    /// Layout-only elements that never carry a value.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            FieldType::Section | FieldType::Header | FieldType::Divider | FieldType::DisplayText
        )
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of the designer-supplied properties blob.
///
/// The persisted form stores this as loosely-typed JSON, sometimes as a
/// JSON-encoded string. Anything unreadable degrades to the defaults so one
/// bad field never aborts evaluation of the rest of the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldProperties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl FieldProperties {
    /// Lenient ingestion: accepts an object, a JSON-encoded string, or
    /// garbage; the latter yields the defaults.
    pub fn from_value(raw: Value) -> Self {
        match raw {
            Value::Object(_) => serde_json::from_value(raw).unwrap_or_default(),
            Value::String(text) => serde_json::from_str(&text).unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

fn lenient_properties<'de, D>(deserializer: D) -> Result<FieldProperties, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.map(FieldProperties::from_value).unwrap_or_default())
}

/// One form input as the designer laid it out.
///
/// Immutable during rule evaluation; only the (external) field editor
/// mutates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub page: u32,
    #[serde(default)]
    pub order: u32,
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: FieldProperties,
}

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::IsNull,
    Operator::IsNotNull,
    Operator::Contains,
    Operator::DoesNotContain,
];

const ORDERED_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::GreaterThan,
    Operator::GreaterThanOrEqual,
    Operator::SmallerThan,
    Operator::SmallerThanOrEqual,
];

const EQUALITY_OPERATORS: &[Operator] = &[Operator::Equals, Operator::NotEquals];

/// Operators a condition may legally test against a field of the given type.
pub fn operators_for(field_type: FieldType) -> &'static [Operator] {
    if field_type.is_text_like() {
        TEXT_OPERATORS
    } else if field_type.is_numeric() || field_type.is_temporal() {
        ORDERED_OPERATORS
    } else {
        // Choice types and everything else get plain equality.
        EQUALITY_OPERATORS
    }
}

/// Design-time option list of a field; empty for non-choice types.
pub fn options_for(field: &Field) -> &[String] {
    if field.field_type.is_choice() {
        &field.properties.options
    } else {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn properties_accept_inline_object() {
        let field: Field = serde_json::from_value(json!({
            "key": "color",
            "type": "dropdown",
            "page": 1,
            "properties": { "options": ["red", "blue"], "required": true }
        }))
        .expect("deserialize");
        assert!(field.properties.required);
        assert_eq!(options_for(&field), &["red".to_string(), "blue".to_string()]);
    }

    #[test]
    fn properties_accept_encoded_string() {
        let field: Field = serde_json::from_value(json!({
            "key": "color",
            "type": "radio",
            "page": 1,
            "properties": "{\"options\": [\"a\"], \"required\": false}"
        }))
        .expect("deserialize");
        assert_eq!(field.properties.options, vec!["a".to_string()]);
    }

    #[test]
    fn malformed_properties_degrade_to_defaults() {
        let field: Field = serde_json::from_value(json!({
            "key": "color",
            "type": "shorttext",
            "page": 1,
            "properties": "{not json"
        }))
        .expect("deserialize");
        assert_eq!(field.properties, FieldProperties::default());
    }

    #[test]
    fn operator_sets_follow_field_class() {
        assert!(operators_for(FieldType::ShortText).contains(&Operator::Contains));
        assert!(operators_for(FieldType::Number).contains(&Operator::GreaterThan));
        assert!(!operators_for(FieldType::Dropdown).contains(&Operator::Contains));
        assert_eq!(operators_for(FieldType::Signature), EQUALITY_OPERATORS);
    }

    #[test]
    fn options_empty_for_non_choice_fields() {
        let field: Field = serde_json::from_value(json!({
            "key": "note",
            "type": "longtext",
            "page": 1,
            "properties": { "options": ["stray"] }
        }))
        .expect("deserialize");
        assert!(options_for(&field).is_empty());
    }
}
