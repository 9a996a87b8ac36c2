//! Security utilities for query construction and credential handling.
//!
//! Generated predicates never contain caller-supplied values: those travel
//! as positional parameters. Identifiers (field and table names) cannot be
//! parameters, so they are always emitted through
//! [`SqlSecurity::quote_identifier`], which double-quotes the name and
//! doubles any embedded quote.

use crate::error::{GuardError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secure string that automatically clears its contents when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value. Use carefully and avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Convert to a regular string. The SecureString will be zeroized.
    pub fn into_string(mut self) -> String {
        let value = std::mem::take(&mut self.0);
        self.0.zeroize();
        value
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// SQL identifier validation and quoting utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Quotes a single identifier.
    ///
    /// This never fails: any name, including one with quotes or spaces,
    /// becomes one quoted identifier that the store resolves literally.
    ///
    /// ```rust
    /// use data_guard::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_identifier("amount"), "\"amount\"");
    /// assert_eq!(SqlSecurity::quote_identifier("a\"b"), "\"a\"\"b\"");
    /// ```
    pub fn quote_identifier(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// Quotes a possibly schema-qualified table name, one segment at a time.
    ///
    /// ```rust
    /// use data_guard::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_qualified("public.orders"), "\"public\".\"orders\"");
    /// ```
    pub fn quote_qualified(identifier: &str) -> String {
        identifier
            .split('.')
            .map(Self::quote_identifier)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Validates a table identifier before it is sent to a store.
    ///
    /// Accepts letters, digits and underscores, optionally dot-qualified,
    /// starting with a letter or underscore, at most 128 bytes, and no
    /// segment that is itself a SQL keyword.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(GuardError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > 128 {
            return Err(GuardError::SecurityError(
                "SQL identifier too long (max 128 characters)".to_string(),
            ));
        }

        if identifier.contains('\0') {
            return Err(GuardError::SecurityError(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(GuardError::SecurityError(format!(
                "Invalid SQL identifier format: '{identifier}'. Identifiers must start with a letter or underscore and contain only letters, numbers, underscores, and dots"
            )));
        }

        Self::check_reserved_segments(identifier)
    }

    fn check_reserved_segments(identifier: &str) -> Result<()> {
        const RESERVED: &[&str] = &[
            "union", "select", "insert", "update", "delete", "drop", "create", "alter", "exec",
            "execute", "declare", "truncate",
        ];

        for segment in identifier.split('.') {
            let lower = segment.to_lowercase();
            if RESERVED.contains(&lower.as_str()) {
                return Err(GuardError::SecurityError(format!(
                    "SQL identifier segment is a reserved keyword: '{segment}'"
                )));
            }
        }
        Ok(())
    }
}
