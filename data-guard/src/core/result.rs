//! Validation result types.

use super::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall outcome of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Pass,
    Fail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Status::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Status::Fail)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failure found while validating a record.
///
/// Schema violations carry no `rule_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl ErrorDetail {
    /// A schema-level failure on `field`.
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule_id: None,
            field: field.into(),
            value: None,
            reason: reason.into(),
            record_id: None,
        }
    }

    /// A check-level failure raised by rule `rule_id`.
    pub fn rule(
        rule_id: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: Some(rule_id.into()),
            field: field.into(),
            value: None,
            reason: reason.into(),
            record_id: None,
        }
    }

    /// Attaches the offending value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Attaches the identifier of the failing record.
    pub fn with_record_id(mut self, record_id: Option<String>) -> Self {
        self.record_id = record_id;
        self
    }

    /// Returns true if this failure came from the schema gate.
    pub fn is_schema_violation(&self) -> bool {
        self.rule_id.is_none()
    }
}

/// The outcome of one validation run over a batch of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub source_id: String,
    pub status: Status,
    pub records_checked: usize,
    pub rules_failed: usize,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
    pub timestamp: DateTime<Utc>,
}

impl ValidationResult {
    /// Starts a passing result for `records_checked` records.
    pub fn new(source_id: impl Into<String>, records_checked: usize) -> Self {
        Self {
            source_id: source_id.into(),
            status: Status::Pass,
            records_checked,
            rules_failed: 0,
            errors: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Records one failure. Status follows `rules_failed`.
    pub fn record_failure(&mut self, detail: ErrorDetail) {
        self.rules_failed += 1;
        self.status = Status::Fail;
        self.errors.push(detail);
    }

    pub fn is_pass(&self) -> bool {
        self.status.is_pass()
    }

    pub fn is_fail(&self) -> bool {
        self.status.is_fail()
    }

    /// Failures raised by the schema gate.
    pub fn schema_violations(&self) -> impl Iterator<Item = &ErrorDetail> {
        self.errors.iter().filter(|e| e.is_schema_violation())
    }

    /// Failures raised by rule `rule_id`.
    pub fn errors_for_rule<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a ErrorDetail> {
        self.errors
            .iter()
            .filter(move |e| e.rule_id.as_deref() == Some(rule_id))
    }
}
