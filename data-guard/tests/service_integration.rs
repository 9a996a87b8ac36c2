//! Service-level tests: history, alert transitions and request handling.

use async_trait::async_trait;
use data_guard::alerting::{Alert, AlertKind, AlertManager, Notifier};
use data_guard::config::GuardConfig;
use data_guard::core::{Check, Rule, Status};
use data_guard::repository::{AlertStateStore, InMemoryRepository};
use data_guard::service::{IngestRequest, ValidationService};
use data_guard::{GuardError, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct CollectingNotifier {
    alerts: Mutex<Vec<Alert>>,
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        self.alerts.lock().await.push(alert.clone());
        Ok(())
    }
}

fn request(source_id: &str, amount: i64) -> IngestRequest {
    IngestRequest {
        source_id: source_id.to_string(),
        rules: vec![Rule::new("positive", "amount").check(Check::new("gt", 0))],
        data: vec![[("amount".to_string(), amount.into())].into()],
        ..Default::default()
    }
}

fn wired_service() -> (ValidationService, InMemoryRepository, Arc<CollectingNotifier>) {
    let repository = InMemoryRepository::new();
    let notifier = Arc::new(CollectingNotifier::default());
    let alerts = AlertManager::new(notifier.clone(), Arc::new(repository.clone()));
    let service = ValidationService::new(GuardConfig::default().with_history_limits(2, 3))
        .unwrap()
        .with_repository(Arc::new(repository.clone()))
        .with_alert_manager(alerts);
    (service, repository, notifier)
}

// Runs are ordered by timestamp; keep consecutive ingests distinguishable.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test]
async fn test_recent_runs_newest_first_with_limits() {
    let (service, repository, _) = wired_service();

    for amount in [1, -1, 2, 3] {
        service.ingest(request("payments", amount)).await.unwrap();
        tick().await;
    }
    service.ingest(request("orders", -9)).await.unwrap();
    assert_eq!(repository.size().await, 5);

    let default_limit = service.recent_runs(None, None).await.unwrap();
    assert_eq!(default_limit.len(), 2);
    assert_eq!(default_limit[0].source_id, "orders");

    let clamped = service.recent_runs(Some("payments"), Some(50)).await.unwrap();
    assert_eq!(clamped.len(), 3);
    assert!(clamped.iter().all(|r| r.source_id == "payments"));
    assert!(clamped.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    let statuses: Vec<_> = clamped.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![Status::Pass, Status::Pass, Status::Fail]);

    let zero_means_default = service.recent_runs(Some(""), Some(0)).await.unwrap();
    assert_eq!(zero_means_default.len(), 2);
}

#[tokio::test]
async fn test_alerts_fire_once_per_transition() {
    let (service, repository, notifier) = wired_service();

    for amount in [5, -1, -2, -3, 4, 6, -7] {
        service.ingest(request("payments", amount)).await.unwrap();
    }

    let kinds: Vec<_> = notifier.alerts.lock().await.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![AlertKind::Failure, AlertKind::Recovery, AlertKind::Failure]
    );
    assert_eq!(
        repository.last_state("payments").await.unwrap(),
        Some(Status::Fail)
    );

    let alerts = notifier.alerts.lock().await;
    assert_eq!(alerts[0].title, "Data Validation Failed");
    assert!(alerts[0].message.contains("Rules Failed: 1"));
    assert!(alerts[1]
        .message
        .contains("has recovered and is passing validation"));
}

#[tokio::test]
async fn test_sources_track_alert_state_independently() {
    let (service, _, notifier) = wired_service();

    service.ingest(request("a", -1)).await.unwrap();
    service.ingest(request("b", 1)).await.unwrap();
    service.ingest(request("b", -1)).await.unwrap();
    service.ingest(request("a", -1)).await.unwrap();

    let sources: Vec<_> = notifier
        .alerts
        .lock()
        .await
        .iter()
        .map(|a| (a.source_id.clone(), a.kind))
        .collect();
    assert_eq!(
        sources,
        vec![
            ("a".to_string(), AlertKind::Failure),
            ("b".to_string(), AlertKind::Failure),
        ]
    );
}

#[tokio::test]
async fn test_ingest_json_round_trip() {
    let service = ValidationService::in_memory(GuardConfig::default()).unwrap();
    let body = json!({
        "source_id": "users",
        "schema": {"age": "number"},
        "rules": [{"id": "adult", "field": "age", "checks": [{"op": "gte", "value": 18}]}],
        "data": [{"age": 30}, {"age": 12}, {}]
    });

    let response = service
        .ingest_json(body.to_string().as_bytes())
        .await
        .unwrap();
    let report: serde_json::Value = serde_json::from_str(&response).unwrap();

    assert_eq!(report["status"], "FAIL");
    assert_eq!(report["records_checked"], 3);
    assert_eq!(report["rules_failed"], 2);

    let history = service.recent_runs(Some("users"), None).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_ingest_json_rejects_bad_requests() {
    let service = ValidationService::in_memory(GuardConfig::default()).unwrap();

    let err = service.ingest_json(b"{not json").await.unwrap_err();
    assert!(matches!(err, GuardError::InvalidRequest(_)));
    assert!(err.to_string().contains("Invalid request body"));

    let err = service
        .ingest_json(br#"{"source_id": "  ", "data": []}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardError::InvalidRequest(ref m) if m == "source_id is required"));

    let err = service
        .ingest_json(br#"{"source_id": "s", "data": [{"nested": {"a": 1}}]}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardError::InvalidRequest(_)));

    assert!(service.recent_runs(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_service_without_repository_has_no_history() {
    let service = ValidationService::new(GuardConfig::default()).unwrap();
    let result = service.ingest(request("p", -1)).await.unwrap();

    assert!(result.is_fail());
    assert!(service.recent_runs(None, Some(10)).await.unwrap().is_empty());
}
