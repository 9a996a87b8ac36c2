//! In-memory implementation of the repository traits for tests and
//! single-process deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::core::{Status, ValidationResult};
use crate::error::Result;

use super::{AlertStateStore, ResultRepository};

/// Keeps every report and alert state in process memory.
///
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    results: Arc<RwLock<Vec<ValidationResult>>>,
    alert_states: Arc<RwLock<HashMap<String, Status>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored reports.
    pub async fn size(&self) -> usize {
        self.results.read().await.len()
    }

    /// Removes all reports and alert states.
    pub async fn clear(&self) {
        self.results.write().await.clear();
        self.alert_states.write().await.clear();
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository").finish_non_exhaustive()
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    #[instrument(skip(self, result), fields(source_id = %result.source_id, repository_type = "in_memory"))]
    async fn save_result(&self, result: &ValidationResult) -> Result<()> {
        self.results.write().await.push(result.clone());
        Ok(())
    }

    #[instrument(skip(self), fields(repository_type = "in_memory"))]
    async fn recent_runs(
        &self,
        source_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ValidationResult>> {
        let store = self.results.read().await;

        let mut runs: Vec<ValidationResult> = store
            .iter()
            .filter(|run| source_id.is_none_or(|id| id.is_empty() || run.source_id == id))
            .cloned()
            .collect();
        drop(store);

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        runs.truncate(limit);
        Ok(runs)
    }
}

#[async_trait]
impl AlertStateStore for InMemoryRepository {
    async fn last_state(&self, source_id: &str) -> Result<Option<Status>> {
        Ok(self.alert_states.read().await.get(source_id).copied())
    }

    #[instrument(skip(self), fields(repository_type = "in_memory"))]
    async fn update_state(&self, source_id: &str, status: Status) -> Result<()> {
        self.alert_states
            .write()
            .await
            .insert(source_id.to_string(), status);
        Ok(())
    }
}
