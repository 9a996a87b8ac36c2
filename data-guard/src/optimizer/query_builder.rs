//! Translates push-down rules into a failure predicate.
//!
//! The predicate selects every row that violates at least one rule, using
//! the same pass/fail semantics as the in-memory operators:
//!
//! - a check becomes its fail region (`gt v` becomes `f IS NULL OR f <= v`,
//!   because a null value is not a number and fails `gt` in memory);
//! - a rule fails if any of its checks fails, so its fail regions are ORed
//!   inside one parenthesized clause;
//! - a guard becomes its satisfied region and is ANDed in front;
//! - rule clauses are ORed together.
//!
//! Values are bound as `$1, $2, ...` in rule order, guard before checks.

use crate::core::{Check, Condition, Rule, Value};
use crate::security::SqlSecurity;
use serde::Serialize;

/// A failure predicate over one table plus its positional arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FailureQuery {
    pub table: String,
    /// Boolean expression selecting failing rows; empty when no rule
    /// translated.
    pub predicate: String,
    /// Values for `$1..$n`, in placeholder order.
    pub args: Vec<Value>,
}

impl FailureQuery {
    pub fn is_empty(&self) -> bool {
        self.predicate.is_empty()
    }

    /// Renders the full statement, or `None` when there is nothing to run.
    ///
    /// ```rust
    /// use data_guard::core::{Check, Rule};
    /// use data_guard::optimizer::build_failure_query;
    ///
    /// let rules = vec![Rule::new("r", "amount").check(Check::new("gt", 10))];
    /// let query = build_failure_query("orders", &rules);
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     r#"SELECT * FROM "orders" WHERE ("amount" IS NULL OR "amount" <= $1)"#
    /// );
    /// ```
    pub fn to_sql(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!(
            "SELECT * FROM {} WHERE {}",
            SqlSecurity::quote_qualified(&self.table),
            self.predicate
        ))
    }
}

/// Builds the failure predicate for `rules` against `table`.
///
/// Rules that yield no translatable clause contribute nothing and bind no
/// arguments.
pub fn build_failure_query(table: &str, rules: &[Rule]) -> FailureQuery {
    let mut clauses = Vec::new();
    let mut args = Vec::new();

    for rule in rules {
        let mut params = Params::starting_at(args.len());
        if let Some(clause) = rule_clause(rule, &mut params) {
            clauses.push(clause);
            args.extend(params.values);
        }
    }

    FailureQuery {
        table: table.to_string(),
        predicate: clauses.join(" OR "),
        args,
    }
}

/// Placeholder allocation for one rule; committed only if the rule
/// produces a clause.
struct Params {
    offset: usize,
    values: Vec<Value>,
}

impl Params {
    fn starting_at(offset: usize) -> Self {
        Self {
            offset,
            values: Vec::new(),
        }
    }

    fn bind(&mut self, value: &Value) -> String {
        self.values.push(value.clone());
        format!("${}", self.offset + self.values.len())
    }
}

/// Rows satisfying a guard.
enum GuardRegion {
    All,
    Nothing,
    Where(String),
}

/// Rows failing a check.
enum FailRegion {
    All,
    Nothing,
    Any(Vec<String>),
}

fn rule_clause(rule: &Rule, params: &mut Params) -> Option<String> {
    let guard = match &rule.when {
        None => GuardRegion::All,
        Some(condition) => guard_region(condition, params),
    };
    if matches!(guard, GuardRegion::Nothing) {
        return None;
    }
    let guard_params = params.values.len();

    let field = SqlSecurity::quote_identifier(&rule.field);
    let mut fragments: Vec<String> = Vec::new();
    let mut always_fails = false;

    for check in &rule.checks {
        match fail_region(&field, check, params) {
            FailRegion::All => always_fails = true,
            FailRegion::Nothing => {}
            FailRegion::Any(parts) => {
                for part in parts {
                    if !fragments.contains(&part) {
                        fragments.push(part);
                    }
                }
            }
        }
    }

    let fails = if always_fails {
        // Placeholders bound by the folded checks never reach the text.
        params.values.truncate(guard_params);
        "TRUE".to_string()
    } else if fragments.is_empty() {
        return None;
    } else {
        fragments.join(" OR ")
    };

    Some(match guard {
        GuardRegion::Where(g) if always_fails => format!("({g})"),
        GuardRegion::Where(g) => format!("({g} AND ({fails}))"),
        _ => format!("({fails})"),
    })
}

fn comparison(op: &str) -> Option<(&'static str, &'static str)> {
    // (holds, fails)
    match op {
        "gt" => Some((">", "<=")),
        "lt" => Some(("<", ">=")),
        "gte" => Some((">=", "<")),
        "lte" => Some(("<=", ">")),
        _ => None,
    }
}

fn fail_region(field: &str, check: &Check, params: &mut Params) -> FailRegion {
    let value = &check.value;
    match check.op.as_str() {
        "not_null" => FailRegion::Any(vec![format!("{field} IS NULL")]),
        "eq" => match value {
            Value::Null => FailRegion::Any(vec![format!("{field} IS NOT NULL")]),
            Value::List(_) => FailRegion::All,
            _ => {
                let p = params.bind(value);
                FailRegion::Any(vec![format!("{field} IS NULL"), format!("{field} <> {p}")])
            }
        },
        "neq" => match value {
            Value::Null => FailRegion::Any(vec![format!("{field} IS NULL")]),
            Value::List(_) => FailRegion::Nothing,
            _ => {
                let p = params.bind(value);
                FailRegion::Any(vec![format!("{field} = {p}")])
            }
        },
        op => match comparison(op) {
            Some(_) if value.as_number().is_none() => FailRegion::All,
            Some((_, fails)) => {
                let p = params.bind(value);
                FailRegion::Any(vec![
                    format!("{field} IS NULL"),
                    format!("{field} {fails} {p}"),
                ])
            }
            None => FailRegion::Nothing,
        },
    }
}

fn guard_region(condition: &Condition, params: &mut Params) -> GuardRegion {
    let field = SqlSecurity::quote_identifier(&condition.field);
    let value = &condition.value;
    match condition.op.as_str() {
        "not_null" => GuardRegion::Where(format!("{field} IS NOT NULL")),
        "eq" => match value {
            Value::Null => GuardRegion::Where(format!("{field} IS NULL")),
            Value::List(_) => GuardRegion::Nothing,
            _ => {
                let p = params.bind(value);
                GuardRegion::Where(format!("{field} = {p}"))
            }
        },
        "neq" => match value {
            Value::Null => GuardRegion::Where(format!("{field} IS NOT NULL")),
            Value::List(_) => GuardRegion::All,
            _ => {
                let p = params.bind(value);
                GuardRegion::Where(format!("({field} IS NULL OR {field} <> {p})"))
            }
        },
        op => match comparison(op) {
            Some(_) if value.as_number().is_none() => GuardRegion::Nothing,
            Some((holds, _)) => {
                let p = params.bind(value);
                GuardRegion::Where(format!("{field} {holds} {p}"))
            }
            None => GuardRegion::Nothing,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_gt_rule() {
        let rules = vec![Rule::new("r", "amount").check(Check::new("gt", 10))];
        let query = build_failure_query("orders", &rules);

        assert_eq!(query.predicate, r#"("amount" IS NULL OR "amount" <= $1)"#);
        assert_eq!(query.args, vec![Value::from(10)]);
    }

    #[test]
    fn test_multiple_rules_are_ored_and_args_ordered() {
        let rules = vec![
            Rule::new("r1", "amount")
                .check(Check::unary("not_null"))
                .check(Check::new("gt", 0)),
            Rule::new("r2", "status").check(Check::new("eq", "active")),
        ];

        let query = build_failure_query("orders", &rules);

        assert_eq!(
            query.predicate,
            r#"("amount" IS NULL OR "amount" <= $1) OR ("status" IS NULL OR "status" <> $2)"#
        );
        assert_eq!(query.args, vec![Value::from(0), Value::from("active")]);
    }

    #[test]
    fn test_each_operator_inversion() {
        let cases = [
            (Check::new("lt", 5), r#"("x" IS NULL OR "x" >= $1)"#),
            (Check::new("gte", 5), r#"("x" IS NULL OR "x" < $1)"#),
            (Check::new("lte", 5), r#"("x" IS NULL OR "x" > $1)"#),
            (Check::new("neq", "a"), r#"("x" = $1)"#),
            (Check::new("eq", Value::Null), r#"("x" IS NOT NULL)"#),
            (Check::new("neq", Value::Null), r#"("x" IS NULL)"#),
        ];
        for (check, expected) in cases {
            let query = build_failure_query("t", &[Rule::new("r", "x").check(check)]);
            assert_eq!(query.predicate, expected);
        }
    }

    #[test]
    fn test_not_null_binds_no_argument() {
        let rules = vec![Rule::new("r", "email").check(Check::unary("not_null"))];
        let query = build_failure_query("users", &rules);
        assert_eq!(query.predicate, r#"("email" IS NULL)"#);
        assert!(query.args.is_empty());
    }

    #[test]
    fn test_guard_is_anded() {
        let rules = vec![Rule::new("r", "amount")
            .when(Condition::new("type", "eq", "credit"))
            .check(Check::new("gt", 0))];

        let query = build_failure_query("payments", &rules);

        assert_eq!(
            query.predicate,
            r#"("type" = $1 AND ("amount" IS NULL OR "amount" <= $2))"#
        );
        assert_eq!(query.args, vec![Value::from("credit"), Value::from(0)]);
    }

    #[test]
    fn test_non_numeric_threshold_fails_every_row() {
        let rules = vec![
            Rule::new("r1", "amount")
                .check(Check::new("eq", 3))
                .check(Check::new("gt", "zero")),
            Rule::new("r2", "qty").check(Check::new("lt", 9)),
        ];

        let query = build_failure_query("t", &rules);

        assert_eq!(query.predicate, r#"(TRUE) OR ("qty" IS NULL OR "qty" >= $1)"#);
        assert_eq!(query.args, vec![Value::from(9)]);
    }

    #[test]
    fn test_unsatisfiable_guard_drops_rule() {
        let rules = vec![
            Rule::new("r1", "amount")
                .when(Condition::new("kind", "gt", "high"))
                .check(Check::new("gt", 0)),
            Rule::new("r2", "amount").check(Check::new("lt", 100)),
        ];

        let query = build_failure_query("t", &rules);

        assert_eq!(query.predicate, r#"("amount" IS NULL OR "amount" >= $1)"#);
        assert_eq!(query.args, vec![Value::from(100)]);
    }

    #[test]
    fn test_untranslatable_rule_contributes_nothing() {
        let rules = vec![
            Rule::new("no_checks", "amount"),
            Rule::new("list_neq", "amount").check(Check::new("neq", vec![1, 2])),
        ];
        let query = build_failure_query("t", &rules);
        assert!(query.is_empty());
        assert!(query.args.is_empty());
        assert!(query.to_sql().is_none());
    }

    #[test]
    fn test_empty_rule_set() {
        let query = build_failure_query("orders", &[]);
        assert_eq!(query.predicate, "");
        assert!(query.args.is_empty());
    }

    #[test]
    fn test_identifiers_are_quoted_and_values_never_inlined() {
        let rules = vec![Rule::new("r", "name\" OR 1=1 --").check(Check::new("eq", "'; DROP"))];
        let query = build_failure_query("orders", &rules);

        assert!(!query.predicate.contains("DROP"));
        assert!(query.predicate.contains(r#""name"" OR 1=1 --""#));
        assert_eq!(query.args, vec![Value::from("'; DROP")]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let rules = vec![
            Rule::new("a", "x").check(Check::new("gt", 1)).check(Check::new("lt", 9)),
            Rule::new("b", "y")
                .when(Condition::new("z", "neq", "skip"))
                .check(Check::new("eq", true)),
        ];
        let first = build_failure_query("t", &rules);
        let second = build_failure_query("t", &rules);
        assert_eq!(first, second);
        assert_eq!(
            first.predicate,
            r#"("x" IS NULL OR "x" <= $1 OR "x" >= $2) OR (("z" IS NULL OR "z" <> $3) AND ("y" IS NULL OR "y" <> $4))"#
        );
    }
}
