//! Scheduled task repository trait.
//!
//! Defines the interface for scheduled task persistence operations.

use super::model::ScheduledTask;
use anyhow::Result;
use async_trait::async_trait;

/// An abstract repository for managing scheduled task persistence.
#[async_trait]
pub trait ScheduledTaskRepository: Send + Sync {
    /// Finds a task by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ScheduledTask))`: Task found
    /// - `Ok(None)`: Task not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, task_id: &str) -> Result<Option<ScheduledTask>>;

    /// Saves a task to storage.
    async fn save(&self, task: &ScheduledTask) -> Result<()>;

    /// Deletes a task from storage.
    async fn delete(&self, task_id: &str) -> Result<()>;

    /// Lists all stored tasks.
    async fn list_all(&self) -> Result<Vec<ScheduledTask>>;
}
