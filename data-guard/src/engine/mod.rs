//! The validation engine: schema gate, guard evaluation and check execution.
//!
//! [`validate`] runs every record through three stages:
//!
//! 1. **Schema** ([`schema::check`]): the first type or presence violation is
//!    reported once and the record's rules are skipped.
//! 2. **Guards** ([`condition::applies`]): a rule whose guard does not hold
//!    is skipped silently.
//! 3. **Checks**: each check resolves its operator from the
//!    [registry](crate::operators) and records a failure on an unknown
//!    operator or a failed predicate. Checks never short-circuit.
//!
//! Failures are data in the returned [`ValidationResult`]; nothing here
//! returns an error.
//!
//! # Examples
//!
//! ```rust
//! use data_guard::core::{Check, FieldType, Record, Rule, Schema, Value};
//! use data_guard::engine;
//!
//! let schema: Schema = [("amount".to_string(), FieldType::Number)].into();
//! let rules = vec![Rule::new("positive", "amount").check(Check::new("gt", 0))];
//! let records: Vec<Record> = vec![[("amount".to_string(), Value::from(-5))].into()];
//!
//! let result = engine::validate("payments", &schema, &rules, &records);
//! assert!(result.is_fail());
//! assert_eq!(result.rules_failed, 1);
//! ```

pub mod condition;
pub mod schema;

use crate::core::{ErrorDetail, Record, Rule, Schema, ValidationResult, Value};
use crate::log_rule;
use crate::logging::{truncate_field, LogConfig};
use crate::operators;
use tracing::instrument;

/// Options that shape the report without changing pass/fail semantics.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Field whose value identifies a record in error details.
    pub record_id_field: Option<String>,
    /// Logging behavior for the run.
    pub log_config: LogConfig,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags every error detail with the value of `field`, when present.
    pub fn with_record_id_field(mut self, field: impl Into<String>) -> Self {
        self.record_id_field = Some(field.into());
        self
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }
}

/// Evaluates rule sets against record batches.
///
/// The evaluator holds only options; it is cheap to clone and safe to share
/// between concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    options: ValidationOptions,
}

impl RuleEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validates `records` in input order.
    ///
    /// Errors are ordered by record, then rule, then check.
    #[instrument(
        skip_all,
        fields(source_id = %source_id, records = records.len(), rules = rules.len())
    )]
    pub fn validate(
        &self,
        source_id: &str,
        schema: &Schema,
        rules: &[Rule],
        records: &[Record],
    ) -> ValidationResult {
        let mut result = ValidationResult::new(source_id, records.len());

        for record in records {
            self.validate_record(record, schema, rules, &mut result);
        }

        tracing::info!(
            status = %result.status,
            records_checked = result.records_checked,
            rules_failed = result.rules_failed,
            "Validation run completed"
        );
        result
    }

    fn validate_record(
        &self,
        record: &Record,
        schema: &Schema,
        rules: &[Rule],
        result: &mut ValidationResult,
    ) {
        let record_id = self.record_id(record);
        let log_config = &self.options.log_config;

        if let Some(violation) = schema::check(record, schema) {
            log_rule!(
                log_config,
                field = %violation.field,
                reason = %violation.reason,
                record_id = ?record_id,
                "Schema violation"
            );
            result.record_failure(violation.with_record_id(record_id));
            return;
        }

        for rule in rules {
            if !condition::applies(record, rule.when.as_ref()) {
                continue;
            }

            let value = record.get(&rule.field).unwrap_or(&Value::Null);

            for check in &rule.checks {
                let detail = match operators::lookup(&check.op) {
                    None => ErrorDetail::rule(
                        &rule.id,
                        &rule.field,
                        format!("unknown operator: {}", check.op),
                    ),
                    Some(predicate) => {
                        let outcome = predicate(value, check);
                        if outcome.is_pass() {
                            continue;
                        }
                        ErrorDetail::rule(&rule.id, &rule.field, outcome.reason)
                            .with_value(value.clone())
                    }
                };

                log_rule!(
                    log_config,
                    rule_id = %rule.id,
                    field = %rule.field,
                    op = %check.op,
                    value = %truncate_field(&value.to_string(), log_config.max_field_length),
                    reason = %detail.reason,
                    "Check failed"
                );
                result.record_failure(detail.with_record_id(record_id.clone()));
            }
        }
    }

    fn record_id(&self, record: &Record) -> Option<String> {
        let field = self.options.record_id_field.as_ref()?;
        match record.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.to_string()),
        }
    }
}

/// Validates `records` with default options.
pub fn validate(
    source_id: &str,
    schema: &Schema,
    rules: &[Rule],
    records: &[Record],
) -> ValidationResult {
    RuleEvaluator::new().validate(source_id, schema, rules, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Check, Condition, FieldType, Status};

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn amount_schema() -> Schema {
        [("amount".to_string(), FieldType::Number)].into()
    }

    #[test]
    fn test_scenario_negative_amount_fails() {
        let rules = vec![Rule::new("positive", "amount").check(Check::new("gt", 0))];
        let records = vec![record(&[("amount", Value::from(-5))])];

        let result = validate("payments", &amount_schema(), &rules, &records);

        assert_eq!(result.status, Status::Fail);
        assert_eq!(result.rules_failed, 1);
        assert_eq!(result.errors.len(), 1);
        let err = &result.errors[0];
        assert_eq!(err.field, "amount");
        assert_eq!(err.rule_id.as_deref(), Some("positive"));
        assert_eq!(err.value, Some(Value::from(-5)));
        assert!(err.reason.contains("not greater than"));
    }

    #[test]
    fn test_scenario_unmet_guard_skips_rule() {
        let rules = vec![Rule::new("credit_positive", "amount")
            .when(Condition::new("type", "eq", "credit"))
            .check(Check::new("gt", 0))];
        let records = vec![record(&[
            ("type", Value::from("debit")),
            ("amount", Value::from(-5)),
        ])];

        let result = validate("payments", &Schema::new(), &rules, &records);

        assert_eq!(result.status, Status::Pass);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_schema_failure_suppresses_rules() {
        let rules = vec![Rule::new("positive", "amount")
            .check(Check::new("gt", 0))
            .check(Check::unary("not_null"))];
        let records = vec![
            record(&[("amount", Value::from("lots"))]),
            record(&[("amount", Value::from(3))]),
        ];

        let result = validate("payments", &amount_schema(), &rules, &records);

        assert_eq!(result.records_checked, 2);
        assert_eq!(result.rules_failed, 1);
        assert_eq!(
            result.errors,
            vec![ErrorDetail::schema("amount", "expected number")]
        );
    }

    #[test]
    fn test_checks_do_not_short_circuit() {
        let rules = vec![Rule::new("r", "amount")
            .check(Check::unary("not_null"))
            .check(Check::new("gt", 0))];
        let records = vec![record(&[])];

        let result = validate("s", &Schema::new(), &rules, &records);

        assert_eq!(result.rules_failed, 2);
        let reasons: Vec<_> = result.errors.iter().map(|e| e.reason.as_str()).collect();
        assert_eq!(reasons, vec!["value is null", "value is not a number"]);
        assert_eq!(result.errors[0].value, Some(Value::Null));
    }

    #[test]
    fn test_unknown_check_operator_is_failure() {
        let rules = vec![Rule::new("r", "email")
            .check(Check::new("is_email", Value::Null))
            .check(Check::unary("not_null"))];
        let records = vec![record(&[("email", Value::from("a@b.c"))])];

        let result = validate("s", &Schema::new(), &rules, &records);

        assert_eq!(result.rules_failed, 1);
        assert_eq!(result.errors[0].reason, "unknown operator: is_email");
        assert!(result.errors[0].value.is_none());
    }

    #[test]
    fn test_error_order_follows_record_rule_check() {
        let rules = vec![
            Rule::new("a", "x").check(Check::new("eq", 1)),
            Rule::new("b", "x").check(Check::new("eq", 2)),
        ];
        let records = vec![
            record(&[("x", Value::from(3))]),
            record(&[("x", Value::from(4))]),
        ];

        let result = validate("s", &Schema::new(), &rules, &records);

        let trail: Vec<_> = result
            .errors
            .iter()
            .map(|e| (e.rule_id.clone().unwrap(), e.value.clone().unwrap()))
            .collect();
        assert_eq!(
            trail,
            vec![
                ("a".to_string(), Value::from(3)),
                ("b".to_string(), Value::from(3)),
                ("a".to_string(), Value::from(4)),
                ("b".to_string(), Value::from(4)),
            ]
        );
    }

    #[test]
    fn test_record_id_field() {
        let evaluator =
            RuleEvaluator::with_options(ValidationOptions::new().with_record_id_field("id"));
        let rules = vec![Rule::new("r", "amount").check(Check::new("gt", 0))];
        let records = vec![
            record(&[("id", Value::from("ord-1")), ("amount", Value::from(0))]),
            record(&[("amount", Value::from(0))]),
        ];

        let result = evaluator.validate("s", &Schema::new(), &rules, &records);

        assert_eq!(result.errors[0].record_id.as_deref(), Some("ord-1"));
        assert_eq!(result.errors[1].record_id, None);
    }

    #[test]
    fn test_empty_batch_passes() {
        let result = validate("s", &amount_schema(), &[], &[]);
        assert_eq!(result.records_checked, 0);
        assert!(result.is_pass());
    }
}
