//! Rule guard evaluation.

use crate::core::{Condition, Record, Value};
use crate::operators;

/// Decides whether a rule guarded by `condition` applies to `record`.
///
/// A missing guard always applies. A field absent from the record reads as
/// null. An unregistered operator never applies, so the rule is skipped
/// rather than evaluated under an undefined guard.
pub fn applies(record: &Record, condition: Option<&Condition>) -> bool {
    let Some(condition) = condition else {
        return true;
    };

    let Some(predicate) = operators::lookup(&condition.op) else {
        tracing::debug!(
            op = %condition.op,
            field = %condition.field,
            "Unknown guard operator, skipping rule"
        );
        return false;
    };

    let value = record.get(&condition.field).unwrap_or(&Value::Null);
    predicate(value, &condition.as_check()).is_pass()
}
