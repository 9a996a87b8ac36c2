//! Logging for the engine and its collaborators.
//!
//! Everything logs through `tracing`. [`LogConfig`] decides how chatty a
//! run is: failed checks are only logged when `log_rule_details` is set,
//! so a large failing batch stays quiet in production. Installing a
//! subscriber is left to binaries, through [`setup::init_logging`].

use tracing::Level;

/// How much a validation run and its queries log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Queries are logged with their SQL when this is `DEBUG` or lower.
    pub base_level: Level,
    /// Log one event per failed check or schema violation.
    pub log_rule_details: bool,
    /// Log query executions and row counts.
    pub log_data_operations: bool,
    /// Logged values are cut to this many bytes.
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_rule_details: false,
            log_data_operations: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Every failure and every query, with long values kept.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_rule_details: true,
            log_data_operations: true,
            max_field_length: 1024,
        }
    }

    /// Run summaries and warnings only.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_rule_details: false,
            log_data_operations: false,
            max_field_length: 128,
        }
    }

    /// Same as [`LogConfig::default`].
    pub fn balanced() -> Self {
        Self::default()
    }
}

/// Debug event for a query about to run, gated by `base_level`.
#[macro_export]
macro_rules! log_query {
    ($config:expr, $($arg:tt)*) => {
        if $config.base_level <= tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        }
    };
}

/// Debug event for one failed check, gated by `log_rule_details`.
#[macro_export]
macro_rules! log_rule {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_rule_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Info event for a store round trip, gated by `log_data_operations`.
#[macro_export]
macro_rules! log_store_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes, on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Installing the global subscriber.
pub mod setup {
    use crate::error::{GuardError, Result};

    const QUIET_FILTER: &str = "warn,data_guard=info";
    const VERBOSE_FILTER: &str = "info,data_guard=debug";

    /// Output settings for [`init_logging`].
    #[derive(Debug, Clone, Default)]
    pub struct SubscriberConfig {
        verbose: bool,
        json: bool,
        filter: Option<String>,
    }

    impl SubscriberConfig {
        pub fn new() -> Self {
            Self::default()
        }

        /// Lowers the crate's level to debug.
        pub fn verbose(mut self, verbose: bool) -> Self {
            self.verbose = verbose;
            self
        }

        /// Writes one JSON object per event.
        pub fn json(mut self, json: bool) -> Self {
            self.json = json;
            self
        }

        /// Replaces the computed directives.
        pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
            self.filter = Some(filter.into());
            self
        }

        /// The `EnvFilter` directives used when `RUST_LOG` is unset.
        pub fn filter(&self) -> &str {
            match &self.filter {
                Some(filter) => filter,
                None if self.verbose => VERBOSE_FILTER,
                None => QUIET_FILTER,
            }
        }
    }

    /// Installs the global subscriber on stderr, so stdout stays free for
    /// reports. `RUST_LOG` takes precedence over the configured filter.
    ///
    /// ```rust,no_run
    /// use data_guard::logging::setup::{init_logging, SubscriberConfig};
    ///
    /// init_logging(SubscriberConfig::new().json(true))?;
    /// # Ok::<(), data_guard::GuardError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// [`GuardError::Configuration`] when a subscriber is already installed.
    pub fn init_logging(config: SubscriberConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter()));

        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let fmt_layer = if config.json {
            fmt_layer.json().boxed()
        } else {
            fmt_layer.boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| GuardError::Configuration(format!("cannot install logger: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::setup::SubscriberConfig;
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, Level::INFO);
        assert!(!config.log_rule_details);
        assert!(config.log_data_operations);
        assert_eq!(config.max_field_length, 256);
    }

    #[test]
    fn test_log_config_presets() {
        let verbose = LogConfig::verbose();
        assert_eq!(verbose.base_level, Level::DEBUG);
        assert!(verbose.log_rule_details);

        let production = LogConfig::production();
        assert_eq!(production.base_level, Level::WARN);
        assert!(!production.log_rule_details);
        assert!(!production.log_data_operations);
        assert_eq!(production.max_field_length, 128);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
        assert_eq!(truncate_field("héllo", 2), "h...(truncated)");
    }

    #[test]
    fn test_subscriber_filter() {
        assert_eq!(SubscriberConfig::new().filter(), "warn,data_guard=info");
        assert_eq!(
            SubscriberConfig::new().verbose(true).filter(),
            "info,data_guard=debug"
        );
        assert_eq!(
            SubscriberConfig::new().verbose(true).with_filter("error").filter(),
            "error"
        );
    }
}
