//! Transition-based alerting for validation runs.
//!
//! [`AlertManager`] compares each run's status with the last alerted status
//! of its source and notifies only when the status changes:
//!
//! | last | current | action |
//! |------|---------|--------|
//! | PASS (or unknown) | FAIL | failure alert, state becomes FAIL |
//! | FAIL | PASS | recovery alert, state becomes PASS |
//! | same | same | nothing |
//!
//! The stored state is updated only after the notifier succeeds, so a
//! failed delivery is retried on the next run.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use crate::core::{Status, ValidationResult};
use crate::error::Result;
use crate::repository::AlertStateStore;

#[cfg(feature = "webhook")]
pub mod webhook;

#[cfg(feature = "webhook")]
pub use webhook::{WebhookConfig, WebhookNotifier};

/// The transition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Failure,
    Recovery,
}

impl AlertKind {
    /// Display color for chat-style receivers.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Failure => "#FF0000",
            Self::Recovery => "#36a64f",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failure => write!(f, "failure"),
            Self::Recovery => write!(f, "recovery"),
        }
    }
}

/// One notification about a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub color: String,
    pub source_id: String,
    pub rules_failed: usize,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn failure(result: &ValidationResult) -> Self {
        Self {
            kind: AlertKind::Failure,
            title: "Data Validation Failed".to_string(),
            message: format!(
                "Source '{}' has failed validation.\nRules Failed: {}\nTime: {}",
                result.source_id,
                result.rules_failed,
                result.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            color: AlertKind::Failure.color().to_string(),
            source_id: result.source_id.clone(),
            rules_failed: result.rules_failed,
            timestamp: result.timestamp,
        }
    }

    pub fn recovery(result: &ValidationResult) -> Self {
        Self {
            kind: AlertKind::Recovery,
            title: "Data Validation Recovered".to_string(),
            message: format!(
                "Source '{}' has recovered and is passing validation.",
                result.source_id
            ),
            color: AlertKind::Recovery.color().to_string(),
            source_id: result.source_id.clone(),
            rules_failed: result.rules_failed,
            timestamp: result.timestamp,
        }
    }
}

/// Delivers alerts somewhere.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one alert.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Notification`](crate::error::GuardError::Notification)
    /// when delivery fails.
    async fn send(&self, alert: &Alert) -> Result<()>;
}

/// Writes alerts to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        match alert.kind {
            AlertKind::Failure => tracing::warn!(
                source_id = %alert.source_id,
                rules_failed = alert.rules_failed,
                "{}",
                alert.title
            ),
            AlertKind::Recovery => tracing::info!(source_id = %alert.source_id, "{}", alert.title),
        }
        Ok(())
    }
}

/// Turns run results into alerts on status transitions.
#[derive(Clone)]
pub struct AlertManager {
    notifier: Arc<dyn Notifier>,
    states: Arc<dyn AlertStateStore>,
}

impl AlertManager {
    pub fn new(notifier: Arc<dyn Notifier>, states: Arc<dyn AlertStateStore>) -> Self {
        Self { notifier, states }
    }

    /// Processes one run result and returns the alert that was sent, if any.
    ///
    /// A store read failure is treated like a first run.
    #[instrument(skip(self, result), fields(source_id = %result.source_id, status = %result.status))]
    pub async fn process_result(&self, result: &ValidationResult) -> Result<Option<Alert>> {
        let last = match self.states.last_state(&result.source_id).await {
            Ok(state) => state.unwrap_or(Status::Pass),
            Err(e) => {
                tracing::debug!(error = %e, "Alert state unavailable, assuming PASS");
                Status::Pass
            }
        };

        let alert = match (last, result.status) {
            (Status::Pass, Status::Fail) => Alert::failure(result),
            (Status::Fail, Status::Pass) => Alert::recovery(result),
            _ => return Ok(None),
        };

        self.notifier.send(&alert).await?;
        self.states
            .update_state(&result.source_id, result.status)
            .await?;

        tracing::info!(kind = %alert.kind, "Alert sent");
        Ok(Some(alert))
    }
}

impl std::fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertManager").finish_non_exhaustive()
    }
}
