//! Core data types shared by the engine, the planner and the collaborators.
//!
//! - **[`Value`]**: a dynamically-typed scalar or list
//! - **[`Record`]** / **[`Schema`]**: the validation subject and its declared shape
//! - **[`Rule`]**: an optional [`Condition`] guard plus an ordered list of [`Check`]s
//! - **[`ValidationResult`]**: the report of one run, with one [`ErrorDetail`] per failure
//!
//! ## Example
//!
//! ```rust
//! use data_guard::core::{Check, Condition, Rule, Severity};
//!
//! let rule = Rule::new("credit_positive", "amount")
//!     .when(Condition::new("type", "eq", "credit"))
//!     .check(Check::unary("not_null"))
//!     .check(Check::new("gt", 0))
//!     .severity(Severity::Warning);
//!
//! assert_eq!(rule.operators().collect::<Vec<_>>(), vec!["eq", "not_null", "gt"]);
//! ```

mod result;
mod rule;
mod value;

pub use result::{ErrorDetail, Status, ValidationResult};
pub use rule::{Check, Condition, FieldType, Record, Rule, Schema, Severity};
pub use value::Value;
