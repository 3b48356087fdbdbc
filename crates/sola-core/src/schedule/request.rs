//! Scheduled task creation request model.

use serde::{Deserialize, Serialize};

use super::model::{Recurrence, ScheduledTask, TaskPriority};

/// Request to create a new scheduled task.
///
/// Used by both the scheduler panel form and programmatic callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduledTaskRequest {
    /// Task title (required).
    pub title: String,
    /// Free-form description (optional).
    #[serde(default)]
    pub description: String,
    /// Target agent label (required).
    pub agent: String,
    /// Priority; defaults to medium.
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,
    /// When the task fires (required).
    pub schedule: String,
    /// Repeat cadence; defaults to once.
    #[serde(default = "default_recurrence")]
    pub recurrence: Recurrence,
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

fn default_recurrence() -> Recurrence {
    Recurrence::Once
}

impl CreateScheduledTaskRequest {
    /// Validate the request and return errors if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required and cannot be empty".to_string());
        }
        if self.agent.trim().is_empty() {
            return Err("Target agent is required and cannot be empty".to_string());
        }
        if self.schedule.trim().is_empty() {
            return Err("Schedule is required and cannot be empty".to_string());
        }
        Ok(())
    }

    /// Convert this request into a ScheduledTask.
    pub fn into_task(self) -> ScheduledTask {
        ScheduledTask::new(
            self.title,
            self.description,
            self.agent,
            self.priority,
            self.schedule,
            self.recurrence,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateScheduledTaskRequest {
        CreateScheduledTaskRequest {
            title: "Morning briefing".to_string(),
            description: "Summarize overnight activity".to_string(),
            agent: "sola".to_string(),
            priority: TaskPriority::High,
            schedule: "08:00".to_string(),
            recurrence: Recurrence::Daily,
        }
    }

    #[test]
    fn test_validate_success() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut req = request();
        req.title = "  ".to_string();
        assert!(req.validate().is_err());

        let mut req = request();
        req.agent = String::new();
        assert!(req.validate().is_err());

        let mut req = request();
        req.schedule = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_into_task_carries_fields() {
        let task = request().into_task();
        assert_eq!(task.title, "Morning briefing");
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.recurrence, Recurrence::Daily);
        assert_eq!(task.status, super::super::model::TaskStatus::Active);
        assert!(!task.id.is_empty());
    }
}
