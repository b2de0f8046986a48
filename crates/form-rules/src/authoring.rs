use serde_json::Value;
use thiserror::Error;

use crate::model::{
    Condition, ConditionKind, Field, FieldEffect, FieldType, Operator, PageAction, operators_for,
};
use crate::pages::page_bounds;
use crate::predicate::loose_eq;

/// Why a candidate rule was rejected at save time. The display texts are the
/// messages shown inline to the designer; the candidate is never persisted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthoringError {
    #[error("Condition must affect at least one field.")]
    EmptyThenFields,
    #[error("A mask pattern is required when the action is 'set mask'.")]
    MissingMaskPattern,
    #[error("Mask pattern '{0}' contains no placeholder characters (@, #, *).")]
    MalformedMaskPattern(String),
    #[error("Operator '{0}' requires a comparison value.")]
    MissingValue(Operator),
    #[error("Operator '{0}' does not take a comparison value.")]
    UnexpectedValue(Operator),
    #[error("Operator '{operator}' is not allowed for {field_type} field '{field}'.")]
    OperatorNotAllowed {
        operator: Operator,
        field_type: FieldType,
        field: String,
    },
    #[error("Cannot hide the first or last page.")]
    HideBoundaryPage,
    #[error("A page cannot skip to or hide itself.")]
    SelfTargetPage,
    #[error(
        "Cannot {candidate} the same field(s) when {existing} is already set for the same condition."
    )]
    OppositeActions { candidate: String, existing: String },
    #[error("Cannot set different dependent values for the same controlling field and value.")]
    DependentValuesMismatch,
    #[error("Cannot {0} the same page with the same condition.")]
    DuplicatePageAction(PageAction),
}

/// Validates a candidate rule against the already-accepted set.
///
/// Pure: no inputs are mutated and the result is stable for identical
/// inputs. The scan only looks backward at `existing` (minus any entry with
/// the candidate's own id, so edits do not conflict with themselves), in
/// stored order, and reports the first problem found. Two mutually
/// contradictory rules validated independently are therefore resolved
/// first-come-first-served.
pub fn check_condition(
    candidate: &Condition,
    existing: &[Condition],
    fields: &[Field],
) -> Result<(), AuthoringError> {
    check_structure(candidate, fields)?;
    for other in existing {
        if other.id == candidate.id {
            continue;
        }
        check_pair(candidate, other)?;
    }
    Ok(())
}

/// Replays a full rule set in stored order, checking each rule against the
/// rules before it. Returns every rejection with its position.
pub fn check_all(conditions: &[Condition], fields: &[Field]) -> Vec<(usize, AuthoringError)> {
    let mut rejected = Vec::new();
    for (index, condition) in conditions.iter().enumerate() {
        if let Err(error) = check_condition(condition, &conditions[..index], fields) {
            rejected.push((index, error));
        }
    }
    rejected
}

fn check_structure(candidate: &Condition, fields: &[Field]) -> Result<(), AuthoringError> {
    match &candidate.kind {
        ConditionKind::ShowHide {
            if_field,
            operator,
            value,
            then_fields,
            ..
        } => {
            check_trigger(if_field, *operator, value.as_ref(), fields)?;
            if then_fields.is_empty() {
                return Err(AuthoringError::EmptyThenFields);
            }
        }
        ConditionKind::EnableRequireMask {
            if_field,
            operator,
            value,
            then_action,
            then_fields,
            mask_pattern,
        } => {
            check_trigger(if_field, *operator, value.as_ref(), fields)?;
            if then_fields.is_empty() {
                return Err(AuthoringError::EmptyThenFields);
            }
            if matches!(then_action, FieldEffect::SetMask) {
                match mask_pattern {
                    None => return Err(AuthoringError::MissingMaskPattern),
                    Some(mask) if !mask.is_well_formed() => {
                        return Err(AuthoringError::MalformedMaskPattern(
                            mask.as_str().to_string(),
                        ));
                    }
                    Some(_) => {}
                }
            }
        }
        ConditionKind::Dependent { .. } => {}
        ConditionKind::SkipHidePage {
            if_field,
            operator,
            value,
            then_action,
            source_page,
            target_page,
        } => {
            check_trigger(if_field, *operator, value.as_ref(), fields)?;
            if source_page == target_page {
                return Err(AuthoringError::SelfTargetPage);
            }
            if matches!(then_action, PageAction::Hide)
                && let Some((first, last)) = page_bounds(fields)
                && (*target_page == first || *target_page == last)
            {
                return Err(AuthoringError::HideBoundaryPage);
            }
        }
    }
    Ok(())
}

fn check_trigger(
    if_field: &str,
    operator: Operator,
    value: Option<&Value>,
    fields: &[Field],
) -> Result<(), AuthoringError> {
    if operator.is_null_check() {
        if value.is_some() {
            return Err(AuthoringError::UnexpectedValue(operator));
        }
    } else if value.is_none() {
        return Err(AuthoringError::MissingValue(operator));
    }

    // A dangling ifField is allowed (the rule just never fires), but a known
    // field constrains the operator to its type's legal set.
    if let Some(field) = fields.iter().find(|field| field.key == if_field)
        && !operators_for(field.field_type).contains(&operator)
    {
        return Err(AuthoringError::OperatorNotAllowed {
            operator,
            field_type: field.field_type,
            field: field.key.clone(),
        });
    }
    Ok(())
}

fn check_pair(candidate: &Condition, existing: &Condition) -> Result<(), AuthoringError> {
    match (&candidate.kind, &existing.kind) {
        (
            ConditionKind::ShowHide {
                then_action: candidate_action,
                then_fields: candidate_fields,
                ..
            },
            ConditionKind::ShowHide {
                then_action: existing_action,
                then_fields: existing_fields,
                ..
            },
        ) => {
            if same_trigger(candidate, existing)
                && *candidate_action == existing_action.opposite()
                && overlap(candidate_fields, existing_fields)
            {
                return Err(AuthoringError::OppositeActions {
                    candidate: candidate_action.to_string(),
                    existing: existing_action.to_string(),
                });
            }
        }
        (
            ConditionKind::EnableRequireMask {
                then_action: candidate_action,
                then_fields: candidate_fields,
                ..
            },
            ConditionKind::EnableRequireMask {
                then_action: existing_action,
                then_fields: existing_fields,
                ..
            },
        ) => {
            if same_trigger(candidate, existing)
                && *candidate_action == existing_action.opposite()
                && overlap(candidate_fields, existing_fields)
            {
                return Err(AuthoringError::OppositeActions {
                    candidate: candidate_action.to_string(),
                    existing: existing_action.to_string(),
                });
            }
        }
        (
            ConditionKind::Dependent {
                dependent_field: candidate_dependent,
                dependent_values: candidate_values,
                ..
            },
            ConditionKind::Dependent {
                dependent_field: existing_dependent,
                dependent_values: existing_values,
                ..
            },
        ) => {
            // Element-for-element comparison, order included: two rules
            // listing the same set in a different order still conflict.
            // Compatibility with the stored behavior, kept on purpose.
            if same_trigger(candidate, existing)
                && candidate_dependent == existing_dependent
                && candidate_values != existing_values
            {
                return Err(AuthoringError::DependentValuesMismatch);
            }
        }
        (
            ConditionKind::SkipHidePage {
                then_action: candidate_action,
                target_page: candidate_target,
                ..
            },
            ConditionKind::SkipHidePage {
                then_action: existing_action,
                target_page: existing_target,
                ..
            },
        ) => {
            if same_trigger(candidate, existing)
                && candidate_action == existing_action
                && candidate_target == existing_target
            {
                return Err(AuthoringError::DuplicatePageAction(*candidate_action));
            }
        }
        _ => {}
    }
    Ok(())
}

fn same_trigger(a: &Condition, b: &Condition) -> bool {
    let (a_field, a_operator, a_value) = a.kind.trigger();
    let (b_field, b_operator, b_value) = b.kind.trigger();
    a_field == b_field && a_operator == b_operator && values_equal(a_value, b_value)
}

fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => loose_eq(a, b),
        _ => false,
    }
}

fn overlap(a: &[String], b: &[String]) -> bool {
    a.iter().any(|key| b.contains(key))
}
