//! DataFusion-backed execution of failure queries.

use async_trait::async_trait;
use datafusion::arrow::array::{Array, ArrayRef, AsArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Float64Type, Int64Type};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::arrow::util::display::array_value_to_string;
use datafusion::execution::context::SessionConfig;
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use tracing::{debug, instrument};

use super::FailureQueryExecutor;
use crate::core::{Record, Value};
use crate::error::{ErrorContext, GuardError, Result};
use crate::logging::LogConfig;
use crate::optimizer::FailureQuery;
use crate::security::SqlSecurity;
use crate::{log_query, log_store_op};

/// Executes failure queries against tables registered in a DataFusion
/// [`SessionContext`].
///
/// # Example
///
/// ```rust
/// use data_guard::core::{Check, Rule};
/// use data_guard::optimizer::build_failure_query;
/// use data_guard::sources::{DataFusionExecutor, FailureQueryExecutor};
/// use datafusion::arrow::array::Int64Array;
/// use datafusion::arrow::datatypes::{DataType, Field, Schema};
/// use datafusion::arrow::record_batch::RecordBatch;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> data_guard::Result<()> {
/// let schema = Arc::new(Schema::new(vec![Field::new("amount", DataType::Int64, true)]));
/// let batch = RecordBatch::try_new(
///     schema,
///     vec![Arc::new(Int64Array::from(vec![Some(5), Some(50), None]))],
/// )?;
///
/// let executor = DataFusionExecutor::new();
/// executor.register_batch("orders", batch)?;
///
/// let rules = vec![Rule::new("large", "amount").check(Check::new("gt", 10))];
/// let failures = executor
///     .fetch_failures(&build_failure_query("orders", &rules))
///     .await?;
/// assert_eq!(failures.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DataFusionExecutor {
    ctx: SessionContext,
    log_config: LogConfig,
}

impl DataFusionExecutor {
    /// Creates an executor over a fresh session sized to the host.
    pub fn new() -> Self {
        Self::with_session_config(8192, num_cpus::get())
    }

    pub fn with_session_config(batch_size: usize, target_partitions: usize) -> Self {
        let config = SessionConfig::new()
            .with_batch_size(batch_size.max(1))
            .with_target_partitions(target_partitions.max(1));
        Self::from_context(SessionContext::new_with_config(config))
    }

    /// Wraps an existing session whose tables are already registered.
    pub fn from_context(ctx: SessionContext) -> Self {
        Self {
            ctx,
            log_config: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Registers an in-memory batch as `table`.
    pub fn register_batch(&self, table: &str, batch: RecordBatch) -> Result<()> {
        SqlSecurity::validate_identifier(table)?;
        self.ctx
            .register_batch(table, batch)
            .with_context(|| format!("Failed to register table '{table}'"))?;
        Ok(())
    }

    async fn run(&self, sql: &str, args: &[Value]) -> Result<Vec<Record>> {
        log_query!(self.log_config, sql = %sql, args = args.len(), "Executing query");

        let mut df = self.ctx.sql(sql).await?;
        if !args.is_empty() {
            let params = args.iter().map(to_scalar).collect::<Result<Vec<_>>>()?;
            df = df.with_param_values(params)?;
        }

        let batches = df.collect().await?;
        record_batches_to_records(&batches)
    }
}

impl Default for DataFusionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DataFusionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFusionExecutor")
            .field("session_id", &self.ctx.session_id())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FailureQueryExecutor for DataFusionExecutor {
    #[instrument(skip(self, query), fields(table = %query.table, args = query.args.len()))]
    async fn fetch_failures(&self, query: &FailureQuery) -> Result<Vec<Record>> {
        let Some(sql) = query.to_sql() else {
            debug!("Empty failure query, nothing to execute");
            return Ok(Vec::new());
        };
        SqlSecurity::validate_identifier(&query.table)?;

        let rows = self.run(&sql, &query.args).await?;
        log_store_op!(
            self.log_config,
            table = %query.table,
            violations = rows.len(),
            "Failure query executed"
        );
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn fetch_records(&self, table: &str) -> Result<Vec<Record>> {
        SqlSecurity::validate_identifier(table)?;
        let sql = format!("SELECT * FROM {}", SqlSecurity::quote_qualified(table));

        let rows = self.run(&sql, &[]).await?;
        log_store_op!(self.log_config, table = %table, rows = rows.len(), "Table rows fetched");
        Ok(rows)
    }
}

/// Binds a rule value as a typed literal. The planner runs type coercion
/// afterwards, so an integer column compared with a float keeps float
/// semantics.
fn to_scalar(value: &Value) -> Result<ScalarValue> {
    Ok(match value {
        Value::Null => ScalarValue::Null,
        Value::Bool(b) => ScalarValue::Boolean(Some(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ScalarValue::Int64(Some(i)),
            None => ScalarValue::Float64(n.as_f64()),
        },
        Value::String(s) => ScalarValue::Utf8(Some(s.clone())),
        Value::List(_) => {
            return Err(GuardError::Internal(
                "list values cannot be bound as query parameters".to_string(),
            ))
        }
    })
}

/// Converts Arrow batches into records keyed by column name.
///
/// Integers, floats and decimals become numbers, strings stay strings,
/// booleans stay booleans and SQL nulls become [`Value::Null`]. Any other
/// type is rendered with Arrow's display formatting.
pub fn record_batches_to_records(batches: &[RecordBatch]) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());

    for batch in batches {
        let schema = batch.schema();
        let mut rows = vec![Record::new(); batch.num_rows()];

        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            for (row, value) in rows.iter_mut().zip(column_values(column)?) {
                row.insert(field.name().clone(), value);
            }
        }
        records.extend(rows);
    }
    Ok(records)
}

fn column_values(array: &ArrayRef) -> Result<Vec<Value>> {
    let len = array.len();
    let data_type = array.data_type();

    let values = match data_type {
        DataType::Null => vec![Value::Null; len],
        DataType::Boolean => {
            let array = array.as_boolean();
            (0..len)
                .map(|i| nullable(array, i, || Value::Bool(array.value(i))))
                .collect()
        }
        dt if dt.is_integer() => {
            let cast_array = cast(array, &DataType::Int64)?;
            let ints = cast_array.as_primitive::<Int64Type>();
            (0..len)
                .map(|i| nullable(ints, i, || Value::from(ints.value(i))))
                .collect()
        }
        dt if dt.is_floating()
            || matches!(dt, DataType::Decimal128(..) | DataType::Decimal256(..)) =>
        {
            let cast_array = cast(array, &DataType::Float64)?;
            let floats = cast_array.as_primitive::<Float64Type>();
            (0..len)
                .map(|i| nullable(floats, i, || Value::from_f64(floats.value(i))))
                .collect()
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let cast_array = cast(array, &DataType::Utf8)?;
            let strings = cast_array.as_string::<i32>();
            (0..len)
                .map(|i| nullable(strings, i, || Value::from(strings.value(i))))
                .collect()
        }
        _ => (0..len)
            .map(|i| {
                if array.is_null(i) {
                    Ok(Value::Null)
                } else {
                    Ok(Value::String(array_value_to_string(array, i)?))
                }
            })
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(values)
}

fn nullable(array: &dyn Array, index: usize, value: impl FnOnce() -> Value) -> Value {
    if array.is_null(index) {
        Value::Null
    } else {
        value()
    }
}
