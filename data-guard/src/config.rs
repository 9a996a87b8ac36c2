//! Runtime configuration for the service, the executor and alerting.
//!
//! ```rust
//! use data_guard::config::GuardConfig;
//!
//! let config = GuardConfig::default()
//!     .with_record_id_field("order_id")
//!     .with_history_limits(50, 500);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{GuardError, Result};
use crate::logging::LogConfig;
use crate::security::SecureString;

/// Prefix of every environment variable read by [`GuardConfig::from_env`].
pub const ENV_PREFIX: &str = "DATA_GUARD_";

#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Number of runs returned by history queries that omit a limit.
    pub default_history_limit: usize,
    /// Upper bound applied to any requested history limit.
    pub max_history_limit: usize,
    /// Field used to tag error details with a record identifier.
    pub record_id_field: Option<String>,
    pub log_config: LogConfig,
    /// DataFusion execution batch size.
    pub batch_size: usize,
    /// DataFusion target partitions.
    pub target_partitions: usize,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<SecureString>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            default_history_limit: 20,
            max_history_limit: 1000,
            record_id_field: None,
            log_config: LogConfig::default(),
            batch_size: 8192,
            target_partitions: num_cpus::get(),
            webhook_url: None,
            webhook_secret: None,
        }
    }
}

impl GuardConfig {
    pub fn with_history_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.default_history_limit = default_limit;
        self.max_history_limit = max_limit;
        self
    }

    pub fn with_record_id_field(mut self, field: impl Into<String>) -> Self {
        self.record_id_field = Some(field.into());
        self
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn with_session(mut self, batch_size: usize, target_partitions: usize) -> Self {
        self.batch_size = batch_size;
        self.target_partitions = target_partitions;
        self
    }

    pub fn with_webhook(mut self, url: impl Into<String>, secret: Option<String>) -> Self {
        self.webhook_url = Some(url.into());
        self.webhook_secret = secret.map(SecureString::new);
        self
    }

    /// Clamps a requested history limit into `1..=max_history_limit`,
    /// substituting the default when none was requested.
    pub fn history_limit(&self, requested: Option<usize>) -> usize {
        let limit = match requested {
            None | Some(0) => self.default_history_limit,
            Some(n) => n,
        };
        limit.clamp(1, self.max_history_limit.max(1))
    }

    /// Checks that the settings are usable together.
    pub fn validate(&self) -> Result<()> {
        if self.max_history_limit == 0 {
            return Err(GuardError::Configuration(
                "max_history_limit must be greater than zero".to_string(),
            ));
        }
        if self.default_history_limit == 0 || self.default_history_limit > self.max_history_limit
        {
            return Err(GuardError::Configuration(format!(
                "default_history_limit must be between 1 and {}",
                self.max_history_limit
            )));
        }
        if self.batch_size == 0 || self.target_partitions == 0 {
            return Err(GuardError::Configuration(
                "batch_size and target_partitions must be greater than zero".to_string(),
            ));
        }
        if matches!(self.record_id_field.as_deref(), Some(f) if f.trim().is_empty()) {
            return Err(GuardError::Configuration(
                "record_id_field cannot be blank".to_string(),
            ));
        }
        if let Some(url) = &self.webhook_url {
            let lower = url.to_lowercase();
            if !lower.starts_with("http://") && !lower.starts_with("https://") {
                return Err(GuardError::Configuration(
                    "Webhook URL must start with http:// or https://".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Reads `DATA_GUARD_*` variables over the defaults and validates the
    /// result.
    ///
    /// | variable | setting |
    /// |---|---|
    /// | `DATA_GUARD_HISTORY_LIMIT` | `default_history_limit` |
    /// | `DATA_GUARD_MAX_HISTORY_LIMIT` | `max_history_limit` |
    /// | `DATA_GUARD_RECORD_ID_FIELD` | `record_id_field` |
    /// | `DATA_GUARD_LOG_PROFILE` | `verbose`, `balanced` or `production` |
    /// | `DATA_GUARD_BATCH_SIZE` | `batch_size` |
    /// | `DATA_GUARD_TARGET_PARTITIONS` | `target_partitions` |
    /// | `DATA_GUARD_WEBHOOK_URL` | `webhook_url` |
    /// | `DATA_GUARD_WEBHOOK_SECRET` | `webhook_secret` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through
    /// `lookup`, which receives the full variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |suffix: &str| {
            lookup(&format!("{ENV_PREFIX}{suffix}")).filter(|v| !v.trim().is_empty())
        };
        let mut config = Self::default();

        if let Some(v) = var("HISTORY_LIMIT") {
            config.default_history_limit = parse_usize("HISTORY_LIMIT", &v)?;
        }
        if let Some(v) = var("MAX_HISTORY_LIMIT") {
            config.max_history_limit = parse_usize("MAX_HISTORY_LIMIT", &v)?;
        }
        if let Some(v) = var("RECORD_ID_FIELD") {
            config.record_id_field = Some(v);
        }
        if let Some(v) = var("LOG_PROFILE") {
            config.log_config = match v.to_lowercase().as_str() {
                "verbose" => LogConfig::verbose(),
                "balanced" => LogConfig::balanced(),
                "production" => LogConfig::production(),
                other => {
                    return Err(GuardError::Configuration(format!(
                        "unknown log profile '{other}' in {ENV_PREFIX}LOG_PROFILE"
                    )))
                }
            };
        }
        if let Some(v) = var("BATCH_SIZE") {
            config.batch_size = parse_usize("BATCH_SIZE", &v)?;
        }
        if let Some(v) = var("TARGET_PARTITIONS") {
            config.target_partitions = parse_usize("TARGET_PARTITIONS", &v)?;
        }
        config.webhook_url = var("WEBHOOK_URL");
        config.webhook_secret = var("WEBHOOK_SECRET").map(SecureString::new);

        config.validate()?;
        Ok(config)
    }
}

fn parse_usize(suffix: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        GuardError::Configuration(format!(
            "{ENV_PREFIX}{suffix} must be a non-negative integer, got '{value}'"
        ))
    })
}
