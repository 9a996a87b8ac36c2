//! Rendering of validation reports for terminals and tools.
//!
//! # Examples
//!
//! ```rust
//! use data_guard::core::{ErrorDetail, ValidationResult};
//! use data_guard::formatters::{FormatterConfig, HumanFormatter, ResultFormatter};
//!
//! let mut result = ValidationResult::new("orders", 2);
//! result.record_failure(ErrorDetail::schema("amount", "field missing"));
//!
//! let output = HumanFormatter::with_config(FormatterConfig::ci())
//!     .format(&result)
//!     .unwrap();
//! assert!(output.contains("Validation FAILED"));
//! assert!(output.contains("field missing"));
//! ```

use std::fmt::Write;

use crate::core::{ErrorDetail, ValidationResult};
use crate::error::{GuardError, Result};

/// Configuration options for formatting validation results.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include individual error details
    pub include_errors: bool,
    /// Maximum number of errors to display (`None` for all)
    pub max_errors: Option<usize>,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Whether to include timestamps in output
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_errors: true,
            max_errors: None,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only summary.
    pub fn minimal() -> Self {
        Self {
            include_errors: false,
            max_errors: Some(0),
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Creates a detailed configuration showing everything.
    pub fn detailed() -> Self {
        Self::default()
    }

    /// Creates a configuration suitable for CI/CD environments.
    pub fn ci() -> Self {
        Self {
            include_errors: true,
            max_errors: Some(50),
            use_colors: false,
            include_timestamps: true,
        }
    }

    pub fn with_errors(mut self, include: bool) -> Self {
        self.include_errors = include;
        self
    }

    pub fn with_max_errors(mut self, max: usize) -> Self {
        self.max_errors = Some(max);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn visible_errors<'a>(&self, result: &'a ValidationResult) -> &'a [ErrorDetail] {
        if !self.include_errors {
            return &[];
        }
        let shown = self
            .max_errors
            .map_or(result.errors.len(), |max| max.min(result.errors.len()));
        &result.errors[..shown]
    }
}

/// Trait for formatting validation results into different output formats.
pub trait ResultFormatter {
    fn format(&self, result: &ValidationResult) -> Result<String>;

    /// Formats with an explicit configuration. The default ignores it.
    fn format_with_config(
        &self,
        result: &ValidationResult,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(result)
    }
}

/// Formats validation results as JSON, in the same shape the service
/// returns.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, result: &ValidationResult) -> Result<String> {
        self.format_with_config(result, &self.config)
    }

    fn format_with_config(
        &self,
        result: &ValidationResult,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut filtered = result.clone();
        filtered.errors = config.visible_errors(result).to_vec();

        let json = if self.pretty {
            serde_json::to_string_pretty(&filtered)
        } else {
            serde_json::to_string(&filtered)
        };
        json.map_err(|e| GuardError::Internal(format!("Failed to serialize result to JSON: {e}")))
    }
}

/// Formats validation results for console output.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(
        output: &mut String,
        result: &ValidationResult,
        config: &FormatterConfig,
    ) -> std::fmt::Result {
        let paint = |code: &str, text: &str| {
            if config.use_colors {
                format!("\x1b[{code}m{text}\x1b[0m")
            } else {
                text.to_string()
            }
        };

        writeln!(output)?;
        if result.is_pass() {
            writeln!(output, "✅ {}", paint("32", "Validation PASSED"))?;
        } else {
            writeln!(output, "❌ {}", paint("31", "Validation FAILED"))?;
        }

        writeln!(output)?;
        writeln!(output, "Source: {}", result.source_id)?;
        if config.include_timestamps {
            writeln!(output, "Timestamp: {}", result.timestamp.to_rfc3339())?;
        }
        writeln!(output, "Records checked: {}", result.records_checked)?;
        writeln!(
            output,
            "Failures: {}",
            paint(if result.rules_failed == 0 { "32" } else { "31" }, &result.rules_failed.to_string())
        )?;

        let shown = config.visible_errors(result);
        if !shown.is_empty() {
            writeln!(output)?;
            writeln!(output, "🔍 Failures:")?;

            for (i, detail) in shown.iter().enumerate() {
                let origin = match &detail.rule_id {
                    Some(rule_id) => format!("rule {rule_id}"),
                    None => "schema".to_string(),
                };
                writeln!(output)?;
                writeln!(output, "   #{} {} on field '{}'", i + 1, origin, detail.field)?;
                writeln!(output, "      Reason: {}", detail.reason)?;
                if let Some(value) = &detail.value {
                    writeln!(output, "      Value: {value}")?;
                }
                if let Some(record_id) = &detail.record_id {
                    writeln!(output, "      Record: {record_id}")?;
                }
            }
        }

        if config.include_errors && result.errors.len() > shown.len() {
            writeln!(output)?;
            writeln!(
                output,
                "   ... and {} more failures (use --max-errors to show more)",
                result.errors.len() - shown.len()
            )?;
        }

        writeln!(output)
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, result: &ValidationResult) -> Result<String> {
        self.format_with_config(result, &self.config)
    }

    fn format_with_config(
        &self,
        result: &ValidationResult,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        Self::render(&mut output, result, config)
            .map_err(|e| GuardError::Internal(format!("Failed to format result: {e}")))?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn create_test_result() -> ValidationResult {
        let mut result = ValidationResult::new("orders", 3);
        result.record_failure(ErrorDetail::schema("amount", "expected number"));
        result.record_failure(
            ErrorDetail::rule("positive", "amount", "value -5 is not greater than 0")
                .with_value(Value::from(-5))
                .with_record_id(Some("o-2".to_string())),
        );
        result.record_failure(ErrorDetail::rule("status", "status", "value is null"));
        result
    }

    #[test]
    fn test_formatter_config() {
        let minimal = FormatterConfig::minimal();
        assert!(!minimal.include_errors);
        assert!(!minimal.use_colors);

        let ci = FormatterConfig::ci();
        assert_eq!(ci.max_errors, Some(50));
        assert!(!ci.use_colors);
    }

    #[test]
    fn test_json_formatter() {
        let output = JsonFormatter::new().format(&create_test_result()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["status"], "FAIL");
        assert_eq!(parsed["rules_failed"], 3);
        assert_eq!(parsed["errors"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_json_formatter_respects_max_errors() {
        let formatter =
            JsonFormatter::with_config(FormatterConfig::default().with_max_errors(1)).with_pretty(false);
        let output = formatter.format(&create_test_result()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["errors"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["rules_failed"], 3);
    }

    #[test]
    fn test_human_formatter() {
        let formatter = HumanFormatter::with_config(FormatterConfig::default().with_colors(false));
        let output = formatter.format(&create_test_result()).unwrap();

        assert!(output.contains("❌ Validation FAILED"));
        assert!(output.contains("Source: orders"));
        assert!(output.contains("#1 schema on field 'amount'"));
        assert!(output.contains("#2 rule positive on field 'amount'"));
        assert!(output.contains("Value: -5"));
        assert!(output.contains("Record: o-2"));
    }

    #[test]
    fn test_human_formatter_passing_run() {
        let output = HumanFormatter::with_config(FormatterConfig::minimal())
            .format(&ValidationResult::new("orders", 10))
            .unwrap();
        assert!(output.contains("✅ Validation PASSED"));
        assert!(output.contains("Records checked: 10"));
        assert!(!output.contains("Timestamp"));
    }

    #[test]
    fn test_config_max_errors() {
        let formatter = HumanFormatter::with_config(FormatterConfig::ci().with_max_errors(2));
        let output = formatter.format(&create_test_result()).unwrap();
        assert!(output.contains("... and 1 more failures"));
    }
}
