//! Scheduled task domain model.
//!
//! Scheduled tasks are CRUD-managed locally and are independent of the chat
//! subsystem; the streaming layer never touches them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Priority of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// Lifecycle status of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// The task will fire at its next scheduled time.
    Active,
    /// Temporarily suspended by the user.
    Paused,
    /// Finished; kept for history.
    Completed,
}

/// How often a scheduled task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Once,
    Daily,
    Weekly,
    Monthly,
}

/// A user-managed scheduled task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Unique task identifier (UUID format).
    pub id: String,
    /// Short task title.
    pub title: String,
    /// Longer free-form description.
    pub description: String,
    /// Label of the agent the task targets.
    pub agent: String,
    /// Task priority.
    pub priority: TaskPriority,
    /// Current status.
    pub status: TaskStatus,
    /// When the task should fire (ISO 8601 local time or an HH:MM string).
    pub schedule: String,
    /// Repeat cadence.
    pub recurrence: Recurrence,
    /// Timestamp when the task was created (ISO 8601 format).
    pub created_at: String,
    /// Timestamp when the task was last updated (ISO 8601 format).
    pub updated_at: String,
}

impl ScheduledTask {
    /// Creates an active task with a fresh id and timestamps.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        agent: impl Into<String>,
        priority: TaskPriority,
        schedule: impl Into<String>,
        recurrence: Recurrence,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            agent: agent.into(),
            priority,
            status: TaskStatus::Active,
            schedule: schedule.into(),
            recurrence,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
