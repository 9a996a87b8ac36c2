//! Records, schemas and the rules evaluated against them.

use super::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One validation subject: field name to value.
pub type Record = BTreeMap<String, Value>;

/// Declared type per field. Iteration is lexicographic by field name, which
/// keeps schema validation reproducible.
pub type Schema = BTreeMap<String, FieldType>;

/// The expected type tag of a schema field.
///
/// Tags other than `string`, `number` and `boolean` are kept verbatim and
/// accepted vacuously by the schema validator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Other(String),
}

impl FieldType {
    /// Returns the tag as written in a schema.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Other(tag) => tag,
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            _ => FieldType::Other(tag),
        }
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        FieldType::from(tag.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to a rule.
///
/// Severity is carried through to reports; it does not change how a rule
/// is evaluated. Labels other than `info`, `warning` and `error` are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
    Other(String),
}

impl Severity {
    /// Returns the label as written in a rule.
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Other(label) => label,
        }
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        match label.as_str() {
            "info" => Severity::Info,
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            _ => Severity::Other(label),
        }
    }
}

impl From<&str> for Severity {
    fn from(label: &str) -> Self {
        Severity::from(label.to_string())
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guard deciding whether a rule applies to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: String,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// The condition seen as a check, so guards and checks share operators.
    pub fn as_check(&self) -> Check {
        Check {
            op: self.op.clone(),
            value: self.value.clone(),
        }
    }
}

/// One assertion within a rule. An absent `value` is [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub op: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl Check {
    /// A check whose operator takes no comparison value.
    pub fn unary(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            value: Value::Null,
        }
    }

    pub fn new(op: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: op.into(),
            value: value.into(),
        }
    }
}

/// A named validation requirement on one field.
///
/// Checks run in declaration order and never short-circuit each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub severity: Severity,
}

impl Rule {
    /// Starts a rule with no guard, no checks and the default severity.
    pub fn new(id: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            when: None,
            checks: Vec::new(),
            severity: Severity::default(),
        }
    }

    /// Sets the guard.
    pub fn when(mut self, condition: Condition) -> Self {
        self.when = Some(condition);
        self
    }

    /// Appends a check.
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Sets the severity.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Every operator name this rule uses, guard first.
    pub fn operators(&self) -> impl Iterator<Item = &str> {
        self.when
            .iter()
            .map(|c| c.op.as_str())
            .chain(self.checks.iter().map(|c| c.op.as_str()))
    }
}
