//! Scheduled task CRUD service.
//!
//! A thin facade over the task repository used by the scheduler panel.
//! Entirely independent of the chat/streaming subsystem.

use std::sync::Arc;

use anyhow::{anyhow, Result};

use sola_core::schedule::{
    CreateScheduledTaskRequest, ScheduledTask, ScheduledTaskRepository, TaskStatus,
};
use sola_core::SolaError;

/// Manages the lifecycle of scheduled tasks.
pub struct ScheduledTaskService {
    repository: Arc<dyn ScheduledTaskRepository>,
}

impl ScheduledTaskService {
    /// Creates a service over the given repository.
    pub fn new(repository: Arc<dyn ScheduledTaskRepository>) -> Self {
        Self { repository }
    }

    /// Validates the request and persists a new task.
    pub async fn create(&self, request: CreateScheduledTaskRequest) -> Result<ScheduledTask> {
        request.validate().map_err(|message| anyhow!(message))?;
        let task = request.into_task();
        self.repository.save(&task).await?;
        tracing::info!("[Scheduler] Created task '{}' ({})", task.title, task.id);
        Ok(task)
    }

    /// Returns one task by id.
    pub async fn get(&self, task_id: &str) -> Result<ScheduledTask> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| SolaError::not_found("scheduled task", task_id).into())
    }

    /// Lists all tasks, oldest first.
    pub async fn list(&self) -> Result<Vec<ScheduledTask>> {
        self.repository.list_all().await
    }

    /// Moves a task to a new status.
    pub async fn set_status(&self, task_id: &str, status: TaskStatus) -> Result<ScheduledTask> {
        let mut task = self.get(task_id).await?;
        task.status = status;
        task.updated_at = chrono::Utc::now().to_rfc3339();
        self.repository.save(&task).await?;
        Ok(task)
    }

    /// Replaces a task's stored fields.
    pub async fn update(&self, mut task: ScheduledTask) -> Result<ScheduledTask> {
        // Refuse silent creation through the update path.
        self.get(&task.id).await?;
        task.updated_at = chrono::Utc::now().to_rfc3339();
        self.repository.save(&task).await?;
        Ok(task)
    }

    /// Deletes a task.
    pub async fn delete(&self, task_id: &str) -> Result<()> {
        self.repository.delete(task_id).await?;
        tracing::info!("[Scheduler] Deleted task {}", task_id);
        Ok(())
    }
}
