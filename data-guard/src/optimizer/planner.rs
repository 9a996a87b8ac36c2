//! Partitions rules into push-down and in-memory buckets.

use crate::core::Rule;
use serde::Serialize;

/// Operators with a store-side translation.
pub const PUSHDOWN_OPERATORS: &[&str] = &["not_null", "eq", "neq", "gt", "lt", "gte", "lte"];

/// Where each rule of a rule set should run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionPlan {
    /// Rules that can be translated into a failure predicate.
    pub sql_rules: Vec<Rule>,
    /// Rules that must be evaluated record by record.
    pub memory_rules: Vec<Rule>,
}

impl ExecutionPlan {
    /// Total number of rules planned.
    pub fn len(&self) -> usize {
        self.sql_rules.len() + self.memory_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns true if `op` has a store-side translation.
pub fn is_pushdown_operator(op: &str) -> bool {
    PUSHDOWN_OPERATORS.contains(&op)
}

/// A rule is eligible only if its guard operator and every check operator
/// are push-down operators. One ineligible operator keeps the whole rule in
/// memory.
pub fn is_pushdown_safe(rule: &Rule) -> bool {
    rule.operators().all(is_pushdown_operator)
}

/// Splits `rules` into push-down and in-memory buckets, preserving order
/// within each bucket.
pub fn plan(rules: &[Rule]) -> ExecutionPlan {
    let (sql_rules, memory_rules): (Vec<Rule>, Vec<Rule>) =
        rules.iter().cloned().partition(is_pushdown_safe);

    let plan = ExecutionPlan {
        sql_rules,
        memory_rules,
    };
    tracing::debug!(
        sql_rules = plan.sql_rules.len(),
        memory_rules = plan.memory_rules.len(),
        "Execution plan computed"
    );
    plan
}
