//! # data-guard - Rule-Based Validation for Loosely-Typed Records
//!
//! data-guard validates batches of dynamically-typed records against a
//! declared schema and a list of rules, and reports every failure as data.
//! Rules made only of simple comparisons can also be pushed down to a SQL
//! store as one parameterized failure predicate.
//!
//! ## Quick Start
//!
//! ```rust
//! use data_guard::prelude::*;
//!
//! let schema: Schema = [("amount".to_string(), FieldType::Number)].into();
//! let rules = vec![
//!     Rule::new("credit_positive", "amount")
//!         .when(Condition::new("type", "eq", "credit"))
//!         .check(Check::new("gt", 0)),
//! ];
//! let records: Vec<Record> = vec![
//!     [("type".to_string(), Value::from("credit")), ("amount".to_string(), Value::from(-5))].into(),
//!     [("type".to_string(), Value::from("debit")), ("amount".to_string(), Value::from(-5))].into(),
//! ];
//!
//! let result = validate("payments", &schema, &rules, &records);
//! assert_eq!(result.status, Status::Fail);
//! assert_eq!(result.rules_failed, 1);
//! assert_eq!(result.errors[0].reason, "value -5 is not greater than 0");
//! ```
//!
//! ## Push-down
//!
//! ```rust
//! use data_guard::prelude::*;
//!
//! let rules = vec![Rule::new("large", "amount").check(Check::new("gt", 10))];
//! let PushdownPlan { plan, query } = PushdownPlan::new("orders", &rules);
//!
//! assert_eq!(plan.sql_rules.len(), 1);
//! assert_eq!(query.predicate, r#"("amount" IS NULL OR "amount" <= $1)"#);
//! assert_eq!(query.args, vec![Value::from(10)]);
//! ```
//!
//! The predicate selects exactly the rows the in-memory evaluator would
//! fail, including rows where the field is null. [`sources::TableIngestor`]
//! runs it through DataFusion and evaluates the remaining rules in memory.
//!
//! ## Architecture
//!
//! - **`core`**: values, records, schemas, rules and the run report
//! - **`operators`**: the read-only table of check predicates
//! - **`engine`**: schema gate, guard evaluation and rule execution
//! - **`optimizer`**: push-down planning and failure-query construction
//! - **`sources`**: DataFusion query execution and table ingestion
//! - **`repository`**: run history and alert state storage
//! - **`alerting`**: transition-based notifications
//! - **`service`**: the request-level entry point
//! - **`config`**, **`logging`**, **`formatters`**, **`security`**: ambient support

pub mod alerting;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod operators;
pub mod optimizer;
pub mod prelude;
pub mod repository;
pub mod security;
pub mod service;
pub mod sources;

pub use error::{GuardError, Result};
