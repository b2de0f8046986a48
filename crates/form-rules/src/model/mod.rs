pub mod condition;
pub mod field;

pub use condition::{
    Condition, ConditionKind, FieldEffect, MaskPattern, Operator, PageAction, PageId,
    VisibilityAction,
};
pub use field::{Field, FieldProperties, FieldType, operators_for, options_for};
