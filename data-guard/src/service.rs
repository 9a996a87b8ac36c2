//! Framework-agnostic ingest service.
//!
//! [`ValidationService`] is what an HTTP handler, queue consumer or CLI
//! calls: it decodes a request, runs the engine, stores the report and
//! feeds the alert manager. Storage and alerting are best effort; their
//! failures are logged and never change the returned report.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use crate::alerting::{AlertManager, LogNotifier, Notifier};
use crate::config::GuardConfig;
use crate::core::{Record, Rule, Schema, ValidationResult};
use crate::engine::{RuleEvaluator, ValidationOptions};
use crate::error::{GuardError, Result};
use crate::repository::{InMemoryRepository, ResultRepository};

/// One validation request as received over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub data: Vec<Record>,
}

impl IngestRequest {
    /// Decodes and checks a JSON request body.
    ///
    /// # Errors
    ///
    /// [`GuardError::InvalidRequest`] for an undecodable body or a missing
    /// `source_id`.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| GuardError::invalid_request(format!("Invalid request body: {e}")))?;
        request.check()?;
        Ok(request)
    }

    pub fn check(&self) -> Result<()> {
        if self.source_id.trim().is_empty() {
            return Err(GuardError::invalid_request("source_id is required"));
        }
        Ok(())
    }
}

/// Runs validation requests and keeps their history.
#[derive(Clone)]
pub struct ValidationService {
    config: GuardConfig,
    evaluator: RuleEvaluator,
    repository: Option<Arc<dyn ResultRepository>>,
    alerts: Option<AlertManager>,
}

impl ValidationService {
    /// Creates a service with no storage and no alerting.
    pub fn new(config: GuardConfig) -> Result<Self> {
        config.validate()?;

        let mut options = ValidationOptions::new().with_log_config(config.log_config.clone());
        if let Some(field) = &config.record_id_field {
            options = options.with_record_id_field(field.clone());
        }

        Ok(Self {
            config,
            evaluator: RuleEvaluator::with_options(options),
            repository: None,
            alerts: None,
        })
    }

    /// Creates a service backed by one [`InMemoryRepository`] for both
    /// history and alert state, notifying through the webhook when one is
    /// configured and the log otherwise.
    pub fn in_memory(config: GuardConfig) -> Result<Self> {
        let notifier = Self::notifier(&config)?;
        let repository = InMemoryRepository::new();
        let alerts = AlertManager::new(notifier, Arc::new(repository.clone()));

        Ok(Self::new(config)?
            .with_repository(Arc::new(repository))
            .with_alert_manager(alerts))
    }

    #[cfg(feature = "webhook")]
    fn notifier(config: &GuardConfig) -> Result<Arc<dyn Notifier>> {
        use crate::alerting::{WebhookConfig, WebhookNotifier};

        let Some(url) = &config.webhook_url else {
            return Ok(Arc::new(LogNotifier));
        };
        let mut webhook = WebhookConfig::new(url.clone());
        if let Some(secret) = &config.webhook_secret {
            webhook = webhook.with_secret(secret.expose());
        }
        Ok(Arc::new(WebhookNotifier::new(webhook)?))
    }

    #[cfg(not(feature = "webhook"))]
    fn notifier(config: &GuardConfig) -> Result<Arc<dyn Notifier>> {
        if config.webhook_url.is_some() {
            tracing::warn!("webhook_url is set but the webhook feature is disabled; alerts go to the log");
        }
        Ok(Arc::new(LogNotifier))
    }

    pub fn with_repository(mut self, repository: Arc<dyn ResultRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_alert_manager(mut self, alerts: AlertManager) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Validates one request and returns its report.
    #[instrument(skip(self, request), fields(source_id = %request.source_id))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<ValidationResult> {
        request.check()?;

        let result = self.evaluator.validate(
            &request.source_id,
            &request.schema,
            &request.rules,
            &request.data,
        );

        if let Some(repository) = &self.repository {
            if let Err(e) = repository.save_result(&result).await {
                tracing::warn!(error = %e, "Failed to save validation result");
            }
        }

        if let Some(alerts) = &self.alerts {
            if let Err(e) = alerts.process_result(&result).await {
                tracing::warn!(error = %e, "Failed to process alert");
            }
        }

        Ok(result)
    }

    /// JSON in, JSON out.
    pub async fn ingest_json(&self, body: &[u8]) -> Result<String> {
        let request = IngestRequest::from_json(body)?;
        let result = self.ingest(request).await?;
        Ok(serde_json::to_string(&result)?)
    }

    /// Returns stored runs, newest first. Without a repository there is no
    /// history and the list is empty.
    pub async fn recent_runs(
        &self,
        source_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ValidationResult>> {
        let Some(repository) = &self.repository else {
            return Ok(Vec::new());
        };
        let limit = self.config.history_limit(limit);
        repository.recent_runs(source_id, limit).await
    }
}

impl std::fmt::Debug for ValidationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationService")
            .field("config", &self.config)
            .field("has_repository", &self.repository.is_some())
            .field("has_alerts", &self.alerts.is_some())
            .finish()
    }
}
