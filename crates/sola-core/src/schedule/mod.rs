//! Scheduled task domain: model, creation request, and persistence trait.

pub mod model;
pub mod repository;
pub mod request;

pub use model::{Recurrence, ScheduledTask, TaskPriority, TaskStatus};
pub use repository::ScheduledTaskRepository;
pub use request::CreateScheduledTaskRequest;
