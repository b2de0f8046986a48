#![allow(missing_docs)]

pub mod authoring;
pub mod evaluate;
pub mod model;
pub mod pages;
pub mod predicate;
pub mod schema;
pub mod validate;

pub use authoring::{AuthoringError, check_all, check_condition};
pub use evaluate::{FieldState, Navigation, RenderState, evaluate};
pub use model::{
    Condition, ConditionKind, Field, FieldEffect, FieldProperties, FieldType, MaskPattern,
    Operator, PageAction, PageId, VisibilityAction, operators_for, options_for,
};
pub use pages::{EdgeKind, PageEdge, PageGraph, PageNode, page_bounds, page_graph};
pub use predicate::eval_predicate;
pub use schema::{conditions_schema, fields_schema};
pub use validate::{ValidationError, ValidationResult, validate};
