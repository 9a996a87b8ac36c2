//! The operator registry: named, pure predicates that define check semantics.
//!
//! Every check and every rule guard is resolved through this table. The
//! table is built once on first use and is read-only afterwards, so lookups
//! from concurrent validations need no synchronization.
//!
//! | operator   | passes when                                              |
//! |------------|----------------------------------------------------------|
//! | `not_null` | the value is not null                                    |
//! | `eq`       | the value equals the expected value                      |
//! | `neq`      | the value differs from the expected value                |
//! | `gt`       | both sides are numbers and value > threshold             |
//! | `lt`       | both sides are numbers and value < threshold             |
//! | `gte`      | both sides are numbers and value >= threshold            |
//! | `lte`      | both sides are numbers and value <= threshold            |
//! | `regex`    | the string value contains a match of the pattern         |
//! | `enum`     | the value equals one element of the expected list        |
//!
//! Equality compares numbers by magnitude, so `1` equals `1.0`.
//!
//! # Examples
//!
//! ```rust
//! use data_guard::core::{Check, Value};
//! use data_guard::operators;
//!
//! let gt = operators::lookup("gt").unwrap();
//! assert!(gt(&Value::from(5), &Check::new("gt", 0)).is_pass());
//! assert!(operators::lookup("between").is_none());
//! ```

use crate::core::{Check, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Outcome of one predicate invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub passed: bool,
    /// Why the check failed; empty on success.
    pub reason: String,
}

impl CheckResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: String::new(),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.passed
    }
}

/// A check predicate: `(field value, check) -> outcome`.
pub type OperatorFn = fn(&Value, &Check) -> CheckResult;

/// Immutable name-to-predicate table.
#[derive(Debug)]
pub struct OperatorRegistry {
    operators: HashMap<&'static str, OperatorFn>,
}

static REGISTRY: Lazy<OperatorRegistry> = Lazy::new(OperatorRegistry::builtin);

impl OperatorRegistry {
    fn builtin() -> Self {
        let entries: [(&'static str, OperatorFn); 9] = [
            ("not_null", not_null),
            ("eq", equal),
            ("neq", not_equal),
            ("gt", greater_than),
            ("lt", less_than),
            ("gte", greater_or_equal),
            ("lte", less_or_equal),
            ("regex", regex_match),
            ("enum", enum_match),
        ];
        Self {
            operators: entries.into_iter().collect(),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static OperatorRegistry {
        &REGISTRY
    }

    /// Resolves an operator name.
    pub fn lookup(&self, name: &str) -> Option<OperatorFn> {
        self.operators.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    /// Registered operator names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.operators.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Resolves `name` in the global registry.
pub fn lookup(name: &str) -> Option<OperatorFn> {
    OperatorRegistry::global().lookup(name)
}

fn not_null(value: &Value, _check: &Check) -> CheckResult {
    if value.is_null() {
        CheckResult::fail("value is null")
    } else {
        CheckResult::pass()
    }
}

fn equal(value: &Value, check: &Check) -> CheckResult {
    if value.loosely_equals(&check.value) {
        CheckResult::pass()
    } else {
        CheckResult::fail(format!("expected {}, got {}", check.value, value))
    }
}

fn not_equal(value: &Value, check: &Check) -> CheckResult {
    if value.loosely_equals(&check.value) {
        CheckResult::fail(format!("expected not {}, got {}", check.value, value))
    } else {
        CheckResult::pass()
    }
}

/// Shared body of the four ordering operators.
fn compare(
    value: &Value,
    check: &Check,
    holds: fn(Ordering) -> bool,
    relation: &str,
) -> CheckResult {
    if value.as_number().is_none() {
        return CheckResult::fail("value is not a number");
    }
    if check.value.as_number().is_none() {
        return CheckResult::fail("threshold is not a number");
    }
    match value.numeric_cmp(&check.value) {
        Some(ordering) if holds(ordering) => CheckResult::pass(),
        _ => CheckResult::fail(format!("value {value} is not {relation} {}", check.value)),
    }
}

fn greater_than(value: &Value, check: &Check) -> CheckResult {
    compare(value, check, Ordering::is_gt, "greater than")
}

fn less_than(value: &Value, check: &Check) -> CheckResult {
    compare(value, check, Ordering::is_lt, "less than")
}

fn greater_or_equal(value: &Value, check: &Check) -> CheckResult {
    compare(value, check, Ordering::is_ge, "greater than or equal to")
}

fn less_or_equal(value: &Value, check: &Check) -> CheckResult {
    compare(value, check, Ordering::is_le, "less than or equal to")
}

fn regex_match(value: &Value, check: &Check) -> CheckResult {
    let Some(text) = value.as_str() else {
        return CheckResult::fail("value is not a string");
    };
    let Some(pattern) = check.value.as_str() else {
        return CheckResult::fail("pattern is not a string");
    };
    match Regex::new(pattern) {
        Ok(re) if re.is_match(text) => CheckResult::pass(),
        Ok(_) => CheckResult::fail(format!("value {text} does not match pattern {pattern}")),
        Err(e) => CheckResult::fail(format!("invalid regex: {e}")),
    }
}

fn enum_match(value: &Value, check: &Check) -> CheckResult {
    let Some(allowed) = check.value.as_list() else {
        return CheckResult::fail("enum list must be an array");
    };
    if allowed.iter().any(|item| item.loosely_equals(value)) {
        CheckResult::pass()
    } else {
        CheckResult::fail(format!("value {value} not in enum list {}", check.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(op: &str, value: impl Into<Value>, expected: impl Into<Value>) -> CheckResult {
        let predicate = lookup(op).unwrap();
        predicate(&value.into(), &Check::new(op, expected))
    }

    #[test]
    fn test_registry_names() {
        assert_eq!(
            OperatorRegistry::global().names(),
            vec!["enum", "eq", "gt", "gte", "lt", "lte", "neq", "not_null", "regex"]
        );
        assert!(lookup("between").is_none());
    }

    #[test]
    fn test_not_null() {
        let predicate = lookup("not_null").unwrap();
        assert!(predicate(&Value::from(0), &Check::unary("not_null")).is_pass());
        let result = predicate(&Value::Null, &Check::unary("not_null"));
        assert_eq!(result, CheckResult::fail("value is null"));
    }

    #[test]
    fn test_eq_normalizes_numbers() {
        assert!(run("eq", 1, 1.0).is_pass());
        assert!(run("eq", "active", "active").is_pass());
        assert_eq!(
            run("eq", "inactive", "active").reason,
            "expected active, got inactive"
        );
        assert!(!run("eq", "1", 1).is_pass());
    }

    #[test]
    fn test_neq() {
        assert!(run("neq", 2, 1).is_pass());
        assert!(!run("neq", 1.0, 1).is_pass());
        assert_eq!(run("neq", "x", "x").reason, "expected not x, got x");
        assert!(run("neq", Value::Null, "x").is_pass());
    }

    #[test]
    fn test_gt_boundaries() {
        assert!(!run("gt", 0, 0).is_pass());
        assert!(run("gt", 0.0000001, 0).is_pass());
        assert_eq!(run("gt", "0", 0).reason, "value is not a number");
        assert_eq!(run("gt", 5, "0").reason, "threshold is not a number");
        assert_eq!(run("gt", -5, 0).reason, "value -5 is not greater than 0");
        assert_eq!(run("gt", Value::Null, 0).reason, "value is not a number");
    }

    #[test]
    fn test_lt_gte_lte() {
        assert!(run("lt", 1, 2).is_pass());
        assert!(!run("lt", 2, 2).is_pass());
        assert!(run("gte", 2, 2.0).is_pass());
        assert!(!run("gte", 1.5, 2).is_pass());
        assert!(run("lte", 2, 2).is_pass());
        assert_eq!(
            run("lte", 3, 2).reason,
            "value 3 is not less than or equal to 2"
        );
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let big = 1i64 << 53;
        assert!(!run("eq", big, big + 1).is_pass());
        assert!(run("neq", big, big + 1).is_pass());
        assert!(run("gt", big + 1, big).is_pass());
        assert!(!run("lte", big + 1, big).is_pass());
        assert!(run("gte", u64::MAX, i64::MAX).is_pass());
        assert!(run("eq", big, big as f64).is_pass());
    }

    #[test]
    fn test_regex() {
        assert!(run("regex", "user@example.com", "@example").is_pass());
        assert!(!run("regex", "user", "^[0-9]+$").is_pass());
        assert_eq!(run("regex", 5, ".*").reason, "value is not a string");
        assert_eq!(run("regex", "a", 5).reason, "pattern is not a string");
        assert!(run("regex", "a", "(").reason.starts_with("invalid regex:"));
    }

    #[test]
    fn test_enum() {
        assert!(run("enum", "b", vec!["a", "b"]).is_pass());
        assert!(run("enum", 2.0, vec![1, 2]).is_pass());
        assert_eq!(
            run("enum", "c", vec!["a", "b"]).reason,
            r#"value c not in enum list ["a","b"]"#
        );
        assert_eq!(run("enum", "a", "a").reason, "enum list must be an array");
    }
}
