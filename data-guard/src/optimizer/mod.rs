//! Push-down planning for rule sets.
//!
//! Rules made only of simple comparisons can be evaluated by the backing
//! store instead of record by record. This module:
//! - partitions a rule set into push-down and in-memory buckets ([`plan`])
//! - translates the push-down bucket into one parameterized failure
//!   predicate ([`build_failure_query`])
//!
//! The two outcomes are independent; callers run the predicate, evaluate
//! the in-memory rules, and decide how to combine the findings.
//!
//! ```rust
//! use data_guard::core::{Check, Rule};
//! use data_guard::optimizer::PushdownPlan;
//!
//! let rules = vec![
//!     Rule::new("positive", "amount").check(Check::new("gt", 0)),
//!     Rule::new("email", "email").check(Check::new("regex", "@")),
//! ];
//!
//! let pushdown = PushdownPlan::new("orders", &rules);
//! assert_eq!(pushdown.plan.sql_rules.len(), 1);
//! assert_eq!(pushdown.plan.memory_rules.len(), 1);
//! assert_eq!(pushdown.query.args.len(), 1);
//! ```

pub mod planner;
pub mod query_builder;

pub use planner::{is_pushdown_operator, is_pushdown_safe, plan, ExecutionPlan, PUSHDOWN_OPERATORS};
pub use query_builder::{build_failure_query, FailureQuery};

use crate::core::Rule;
use serde::Serialize;

/// A plan together with the failure query for its push-down bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushdownPlan {
    pub plan: ExecutionPlan,
    pub query: FailureQuery,
}

impl PushdownPlan {
    pub fn new(table: &str, rules: &[Rule]) -> Self {
        let plan = plan(rules);
        let query = build_failure_query(table, &plan.sql_rules);
        Self { plan, query }
    }
}
