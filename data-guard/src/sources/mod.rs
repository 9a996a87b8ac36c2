//! Query execution against a backing store.
//!
//! The engine never runs SQL itself. This module supplies the collaborator
//! that does: a [`FailureQueryExecutor`] runs a
//! [`FailureQuery`](crate::optimizer::FailureQuery) and returns the violating
//! rows as [`Record`]s, and [`TableIngestor`] drives one table through
//! planning, push-down and in-memory evaluation.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use crate::core::{Record, Rule, Schema, ValidationResult};
use crate::engine::RuleEvaluator;
use crate::error::Result;
use crate::optimizer::{ExecutionPlan, FailureQuery, PushdownPlan};

mod datafusion_executor;

pub use datafusion_executor::{record_batches_to_records, DataFusionExecutor};

/// Runs failure queries and reads rows from a store.
#[async_trait]
pub trait FailureQueryExecutor: Send + Sync {
    /// Returns the rows selected by `query`, or nothing for an empty query.
    async fn fetch_failures(&self, query: &FailureQuery) -> Result<Vec<Record>>;

    /// Returns every row of `table`.
    async fn fetch_records(&self, table: &str) -> Result<Vec<Record>>;
}

/// The two outcomes of validating one table.
///
/// They are reported side by side: a row may appear among the push-down
/// violations and also fail an in-memory rule.
#[derive(Debug, Clone, Serialize)]
pub struct TableValidation {
    pub table: String,
    pub plan: ExecutionPlan,
    pub query: FailureQuery,
    /// Rows violating at least one push-down rule.
    pub pushdown_violations: Vec<Record>,
    /// Schema and in-memory rule findings over all rows; `None` when there
    /// was nothing to evaluate in memory.
    pub memory_result: Option<ValidationResult>,
}

impl TableValidation {
    /// True when neither outcome found a problem.
    pub fn is_clean(&self) -> bool {
        self.pushdown_violations.is_empty()
            && self.memory_result.as_ref().is_none_or(|r| r.is_pass())
    }
}

/// Validates whole tables by splitting work between the store and the
/// in-memory engine.
#[derive(Clone)]
pub struct TableIngestor {
    executor: Arc<dyn FailureQueryExecutor>,
    evaluator: RuleEvaluator,
}

impl TableIngestor {
    pub fn new(executor: Arc<dyn FailureQueryExecutor>) -> Self {
        Self {
            executor,
            evaluator: RuleEvaluator::new(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: RuleEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Plans `rules`, runs the failure query for the push-down bucket and
    /// evaluates the schema plus the remaining rules over the table's rows.
    #[instrument(skip(self, schema, rules), fields(table = %table, rules = rules.len()))]
    pub async fn validate_table(
        &self,
        table: &str,
        schema: &Schema,
        rules: &[Rule],
    ) -> Result<TableValidation> {
        let PushdownPlan { plan, query } = PushdownPlan::new(table, rules);

        let pushdown_violations = self.executor.fetch_failures(&query).await?;

        let memory_result = if plan.memory_rules.is_empty() && schema.is_empty() {
            None
        } else {
            let records = self.executor.fetch_records(table).await?;
            Some(
                self.evaluator
                    .validate(table, schema, &plan.memory_rules, &records),
            )
        };

        tracing::info!(
            pushdown_violations = pushdown_violations.len(),
            memory_failures = memory_result.as_ref().map_or(0, |r| r.rules_failed),
            "Table validated"
        );

        Ok(TableValidation {
            table: table.to_string(),
            plan,
            query,
            pushdown_violations,
            memory_result,
        })
    }
}

impl std::fmt::Debug for TableIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableIngestor")
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}
