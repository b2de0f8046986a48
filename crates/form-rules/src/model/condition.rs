use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Comparison operators of the rule language. The wire strings match the
/// persisted records exactly, spaces included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Operator {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "not equals")]
    NotEquals,
    #[serde(rename = "is null")]
    IsNull,
    #[serde(rename = "is not null")]
    IsNotNull,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "does not contain")]
    DoesNotContain,
    #[serde(rename = "greater than")]
    GreaterThan,
    #[serde(rename = "greater than or equal to")]
    GreaterThanOrEqual,
    #[serde(rename = "smaller than")]
    SmallerThan,
    #[serde(rename = "smaller than or equal to")]
    SmallerThanOrEqual,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not equals",
            Operator::IsNull => "is null",
            Operator::IsNotNull => "is not null",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does not contain",
            Operator::GreaterThan => "greater than",
            Operator::GreaterThanOrEqual => "greater than or equal to",
            Operator::SmallerThan => "smaller than",
            Operator::SmallerThanOrEqual => "smaller than or equal to",
        }
    }

    /// Null-check operators take no comparison value.
    pub fn is_null_check(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one logical page, rendered as `page_<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(u32);

impl PageId {
    pub fn new(number: u32) -> Self {
        PageId(number)
    }

    pub fn number(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page_{}", self.0)
    }
}

impl FromStr for PageId {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        text.strip_prefix("page_")
            .and_then(|digits| digits.parse::<u32>().ok())
            .map(PageId)
            .ok_or_else(|| format!("invalid page identifier '{text}'"))
    }
}

impl Serialize for PageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for PageId {
    fn schema_name() -> Cow<'static, str> {
        "PageId".into()
    }

    fn json_schema(_: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": "^page_[0-9]+$"
        })
    }
}

/// Input mask, e.g. `###-##-####`. Placeholders: `@` letter, `#` digit,
/// `*` either; every other character is a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MaskPattern(String);

impl MaskPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        MaskPattern(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A usable mask needs at least one placeholder.
    pub fn is_well_formed(&self) -> bool {
        self.0.chars().any(|ch| matches!(ch, '@' | '#' | '*'))
    }

    /// Character-for-character conformance check used by answer validation.
    pub fn matches(&self, input: &str) -> bool {
        let mut input_chars = input.chars();
        for expected in self.0.chars() {
            let Some(actual) = input_chars.next() else {
                return false;
            };
            let ok = match expected {
                '@' => actual.is_alphabetic(),
                '#' => actual.is_ascii_digit(),
                '*' => actual.is_alphanumeric(),
                literal => actual == literal,
            };
            if !ok {
                return false;
            }
        }
        input_chars.next().is_none()
    }
}

impl fmt::Display for MaskPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Action of a show/hide rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityAction {
    Show,
    Hide,
}

impl VisibilityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityAction::Show => "show",
            VisibilityAction::Hide => "hide",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            VisibilityAction::Show => VisibilityAction::Hide,
            VisibilityAction::Hide => VisibilityAction::Show,
        }
    }
}

impl fmt::Display for VisibilityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action of an enable/require/mask rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FieldEffect {
    #[serde(rename = "require")]
    Require,
    #[serde(rename = "don't require")]
    DontRequire,
    #[serde(rename = "enable")]
    Enable,
    #[serde(rename = "disable")]
    Disable,
    #[serde(rename = "set mask")]
    SetMask,
    #[serde(rename = "unmask")]
    Unmask,
}

impl FieldEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldEffect::Require => "require",
            FieldEffect::DontRequire => "don't require",
            FieldEffect::Enable => "enable",
            FieldEffect::Disable => "disable",
            FieldEffect::SetMask => "set mask",
            FieldEffect::Unmask => "unmask",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            FieldEffect::Require => FieldEffect::DontRequire,
            FieldEffect::DontRequire => FieldEffect::Require,
            FieldEffect::Enable => FieldEffect::Disable,
            FieldEffect::Disable => FieldEffect::Enable,
            FieldEffect::SetMask => FieldEffect::Unmask,
            FieldEffect::Unmask => FieldEffect::SetMask,
        }
    }
}

impl fmt::Display for FieldEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action of a page navigation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PageAction {
    #[serde(rename = "skip to")]
    SkipTo,
    #[serde(rename = "hide")]
    Hide,
}

impl PageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageAction::SkipTo => "skip to",
            PageAction::Hide => "hide",
        }
    }
}

impl fmt::Display for PageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a condition, dispatched on the persisted `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ConditionKind {
    ShowHide {
        if_field: String,
        operator: Operator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        then_action: VisibilityAction,
        then_fields: Vec<String>,
    },
    EnableRequireMask {
        if_field: String,
        operator: Operator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        then_action: FieldEffect,
        then_fields: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mask_pattern: Option<MaskPattern>,
    },
    Dependent {
        if_field: String,
        value: Value,
        dependent_field: String,
        dependent_values: Vec<String>,
    },
    SkipHidePage {
        if_field: String,
        operator: Operator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        then_action: PageAction,
        source_page: PageId,
        target_page: PageId,
    },
}

impl ConditionKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConditionKind::ShowHide { .. } => "show_hide",
            ConditionKind::EnableRequireMask { .. } => "enable_require_mask",
            ConditionKind::Dependent { .. } => "dependent",
            ConditionKind::SkipHidePage { .. } => "skip_hide_page",
        }
    }

    pub fn if_field(&self) -> &str {
        match self {
            ConditionKind::ShowHide { if_field, .. }
            | ConditionKind::EnableRequireMask { if_field, .. }
            | ConditionKind::Dependent { if_field, .. }
            | ConditionKind::SkipHidePage { if_field, .. } => if_field,
        }
    }

    /// Trigger triple as evaluated against live values. Dependent rules
    /// carry an implicit equality operator.
    pub fn trigger(&self) -> (&str, Operator, Option<&Value>) {
        match self {
            ConditionKind::ShowHide {
                if_field,
                operator,
                value,
                ..
            }
            | ConditionKind::EnableRequireMask {
                if_field,
                operator,
                value,
                ..
            }
            | ConditionKind::SkipHidePage {
                if_field,
                operator,
                value,
                ..
            } => (if_field, *operator, value.as_ref()),
            ConditionKind::Dependent {
                if_field, value, ..
            } => (if_field, Operator::Equals, Some(value)),
        }
    }

    pub fn then_fields(&self) -> &[String] {
        match self {
            ConditionKind::ShowHide { then_fields, .. }
            | ConditionKind::EnableRequireMask { then_fields, .. } => then_fields,
            _ => &[],
        }
    }
}

/// One persisted rule record: a trigger predicate plus a resulting action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    pub id: String,
    #[serde(flatten)]
    pub kind: ConditionKind,
}

impl Condition {
    pub fn new(id: impl Into<String>, kind: ConditionKind) -> Self {
        Condition {
            id: id.into(),
            kind,
        }
    }

    /// Placeholder identifier for a rule that has not been persisted yet.
    pub fn local_id(timestamp_millis: u64) -> String {
        format!("local_{timestamp_millis}")
    }

    pub fn is_local(&self) -> bool {
        self.id.starts_with("local_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn condition_round_trips_through_wire_names() {
        let raw = json!({
            "id": "c1",
            "type": "enable_require_mask",
            "ifField": "HasSSN",
            "operator": "equals",
            "value": "true",
            "thenAction": "set mask",
            "thenFields": ["SSN"],
            "maskPattern": "###-##-####"
        });
        let condition: Condition = serde_json::from_value(raw.clone()).expect("deserialize");
        assert_eq!(condition.kind.type_name(), "enable_require_mask");
        assert_eq!(condition.kind.if_field(), "HasSSN");
        let back = serde_json::to_value(&condition).expect("serialize");
        assert_eq!(back, raw);
    }

    #[test]
    fn operator_strings_keep_spaces() {
        let operator: Operator =
            serde_json::from_value(json!("greater than or equal to")).expect("deserialize");
        assert_eq!(operator, Operator::GreaterThanOrEqual);
        assert!(!operator.is_null_check());
    }

    #[test]
    fn page_id_parses_and_displays() {
        let page: PageId = "page_3".parse().expect("parse");
        assert_eq!(page.number(), 3);
        assert_eq!(page.to_string(), "page_3");
        assert!("page_x".parse::<PageId>().is_err());
        assert!("3".parse::<PageId>().is_err());
    }

    #[test]
    fn mask_matches_placeholders_and_literals() {
        let mask = MaskPattern::new("###-##-####");
        assert!(mask.matches("123-45-6789"));
        assert!(!mask.matches("123456789"));
        assert!(!mask.matches("123-45-67890"));
        let letters = MaskPattern::new("@@-**");
        assert!(letters.matches("ab-1c"));
        assert!(!letters.matches("1b-1c"));
    }

    #[test]
    fn mask_without_placeholders_is_malformed() {
        assert!(!MaskPattern::new("---").is_well_formed());
        assert!(MaskPattern::new("#").is_well_formed());
    }

    #[test]
    fn local_ids_are_recognized() {
        let condition = Condition::new(
            Condition::local_id(1700000000000),
            ConditionKind::Dependent {
                if_field: "Country".into(),
                value: json!("US"),
                dependent_field: "State".into(),
                dependent_values: vec!["CA".into()],
            },
        );
        assert!(condition.is_local());
    }
}
