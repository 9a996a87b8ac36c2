//! Prelude for commonly used types and traits in data-guard.

pub use crate::config::GuardConfig;
pub use crate::core::{
    Check, Condition, ErrorDetail, FieldType, Record, Rule, Schema, Severity, Status,
    ValidationResult, Value,
};
pub use crate::engine::{validate, RuleEvaluator, ValidationOptions};
pub use crate::error::{ErrorContext, GuardError, Result};
pub use crate::formatters::{FormatterConfig, ResultFormatter};
pub use crate::logging::LogConfig;
pub use crate::optimizer::{build_failure_query, plan, ExecutionPlan, FailureQuery, PushdownPlan};
pub use crate::service::{IngestRequest, ValidationService};
