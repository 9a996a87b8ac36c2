//! Webhook delivery for alerts.
//!
//! Alerts are POSTed as JSON. When a secret is configured the body is
//! signed with HMAC-SHA256 and the hex digest is sent in the
//! `X-Signature-256` header as `sha256=<digest>`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ring::hmac;

use super::{Alert, Notifier};
use crate::error::{GuardError, Result};
use crate::security::SecureString;

/// Configuration for webhook alerting.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    url: String,
    headers: HashMap<String, String>,
    secret: Option<SecureString>,
    timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            secret: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Add a custom header to be sent with webhook requests.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set a secret for HMAC-SHA256 signing of payloads.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecureString::new(secret.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that the URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(GuardError::Configuration(
                "Webhook URL cannot be empty".to_string(),
            ));
        }

        let url_lower = self.url.to_lowercase();
        if !url_lower.starts_with("http://") && !url_lower.starts_with("https://") {
            return Err(GuardError::Configuration(
                "Webhook URL must start with http:// or https://".to_string(),
            ));
        }

        if reqwest::Url::parse(&self.url).is_err() {
            return Err(GuardError::Configuration(format!(
                "Invalid webhook URL: {}",
                self.url
            )));
        }

        Ok(())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn secret(&self) -> Option<&SecureString> {
        self.secret.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Sends alerts to an HTTP endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    /// Builds a notifier after validating `config`.
    pub fn new(config: WebhookConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                GuardError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Sign a payload using HMAC-SHA256.
    pub fn sign_payload(body: &str, secret: &str) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, body.as_bytes());
        hex::encode(signature.as_ref())
    }
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let body = serde_json::to_string(alert)?;

        let mut request = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json");

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        if let Some(secret) = &self.config.secret {
            let signature = Self::sign_payload(&body, secret.expose());
            request = request.header("X-Signature-256", format!("sha256={signature}"));
        }

        let response = request.body(body).send().await.map_err(|e| {
            GuardError::notification_with_source("webhook request failed", Box::new(e))
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GuardError::notification(format!(
                "webhook returned {status}: {message}"
            )));
        }

        tracing::info!(
            source_id = %alert.source_id,
            kind = %alert.kind,
            "Webhook alert delivered"
        );
        Ok(())
    }
}
