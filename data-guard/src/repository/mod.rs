//! Storage for validation history and alert state.
//!
//! Two narrow traits keep the service independent from any particular
//! backend: [`ResultRepository`] persists run reports and
//! [`AlertStateStore`] remembers the last alerted status per source.
//! [`InMemoryRepository`] implements both.

use async_trait::async_trait;

use crate::core::{Status, ValidationResult};
use crate::error::Result;

pub mod in_memory;

pub use in_memory::InMemoryRepository;

/// Persists validation reports.
///
/// # Example
///
/// ```rust
/// use data_guard::core::ValidationResult;
/// use data_guard::repository::{InMemoryRepository, ResultRepository};
///
/// # #[tokio::main]
/// # async fn main() -> data_guard::Result<()> {
/// let repository = InMemoryRepository::new();
/// repository.save_result(&ValidationResult::new("orders", 3)).await?;
///
/// let runs = repository.recent_runs(Some("orders"), 10).await?;
/// assert_eq!(runs.len(), 1);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Stores one run report.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Repository`](crate::error::GuardError::Repository)
    /// if the backend rejects the write.
    async fn save_result(&self, result: &ValidationResult) -> Result<()>;

    /// Returns at most `limit` reports, newest first.
    ///
    /// When `source_id` is given only that source's reports are considered.
    async fn recent_runs(
        &self,
        source_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ValidationResult>>;
}

/// Remembers the last status an alert was sent for, per source.
#[async_trait]
pub trait AlertStateStore: Send + Sync {
    /// The last recorded status for `source_id`, or `None` on first sight.
    async fn last_state(&self, source_id: &str) -> Result<Option<Status>>;

    async fn update_state(&self, source_id: &str, status: Status) -> Result<()>;
}
