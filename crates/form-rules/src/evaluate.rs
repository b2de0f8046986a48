use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::model::{
    Condition, ConditionKind, Field, FieldEffect, MaskPattern, PageAction, PageId,
    VisibilityAction, options_for,
};
use crate::pages::page_bounds;
use crate::predicate::{eval_predicate, loose_eq};

/// Effective render state of one field.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct FieldState {
    pub visible: bool,
    pub required: bool,
    pub enabled: bool,
    pub mask: Option<MaskPattern>,
    pub options: Vec<String>,
}

/// Page navigation decision for the current fill session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct Navigation {
    pub skip_to: Option<PageId>,
    pub hidden_pages: BTreeSet<PageId>,
}

/// Full render-state patch the host applies after each value change.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct RenderState {
    pub fields: BTreeMap<String, FieldState>,
    pub navigation: Navigation,
}

impl RenderState {
    pub fn field(&self, key: &str) -> Option<&FieldState> {
        self.fields.get(key)
    }

    pub fn is_page_hidden(&self, page: PageId) -> bool {
        self.navigation.hidden_pages.contains(&page)
    }
}

/// Computes the effective render state for every field plus the navigation
/// decision for `current_page`.
///
/// Pure and full-recompute: call it on every value change or page
/// transition. Conditions are applied in stored order and the last matching
/// condition wins per state slot; this tie-break mirrors the persisted
/// insertion order of the rules and is relied upon by existing forms.
/// Conditions referencing fields that no longer exist are skipped, never
/// removed.
pub fn evaluate(
    fields: &[Field],
    conditions: &[Condition],
    current_values: &Value,
    current_page: PageId,
) -> RenderState {
    let mut states: BTreeMap<String, FieldState> = fields
        .iter()
        .map(|field| {
            (
                field.key.clone(),
                FieldState {
                    visible: true,
                    required: field.properties.required,
                    enabled: true,
                    mask: None,
                    options: options_for(field).to_vec(),
                },
            )
        })
        .collect();
    let mut navigation = Navigation::default();
    let bounds = page_bounds(fields);

    for condition in conditions {
        // Dangling trigger field: skip silently.
        if !states.contains_key(condition.kind.if_field()) {
            continue;
        }

        match &condition.kind {
            ConditionKind::ShowHide {
                if_field,
                operator,
                value,
                then_action,
                then_fields,
            } => {
                if eval_predicate(if_field, *operator, value.as_ref(), current_values) {
                    for key in then_fields {
                        if let Some(state) = states.get_mut(key) {
                            state.visible = matches!(then_action, VisibilityAction::Show);
                        }
                    }
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
                if eval_predicate(if_field, *operator, value.as_ref(), current_values) {
                    for key in then_fields {
                        if let Some(state) = states.get_mut(key) {
                            apply_effect(state, *then_action, mask_pattern.as_ref());
                        }
                    }
                }
            }
            ConditionKind::Dependent {
                if_field,
                value,
                dependent_field,
                dependent_values,
            } => {
                let matched = current_values
                    .get(if_field)
                    .is_some_and(|current| loose_eq(current, value));
                if matched && let Some(state) = states.get_mut(dependent_field) {
                    // Replacement, not a merge with the design-time list.
                    state.options = dependent_values.clone();
                }
            }
            ConditionKind::SkipHidePage {
                if_field,
                operator,
                value,
                then_action,
                source_page,
                target_page,
            } => {
                if !eval_predicate(if_field, *operator, value.as_ref(), current_values) {
                    continue;
                }
                match then_action {
                    PageAction::Hide => {
                        // Re-check the authoring invariant for rules persisted
                        // before it existed: terminal pages stay navigable.
                        let is_boundary = bounds
                            .is_some_and(|(first, last)| *target_page == first || *target_page == last);
                        if !is_boundary {
                            navigation.hidden_pages.insert(*target_page);
                        }
                    }
                    PageAction::SkipTo => {
                        if *source_page == current_page {
                            navigation.skip_to = Some(*target_page);
                        }
                    }
                }
            }
        }
    }

    RenderState {
        fields: states,
        navigation,
    }
}

fn apply_effect(state: &mut FieldState, effect: FieldEffect, mask: Option<&MaskPattern>) {
    match effect {
        FieldEffect::Require => state.required = true,
        FieldEffect::DontRequire => state.required = false,
        FieldEffect::Enable => state.enabled = true,
        FieldEffect::Disable => state.enabled = false,
        FieldEffect::SetMask => state.mask = mask.cloned(),
        FieldEffect::Unmask => state.mask = None,
    }
}
