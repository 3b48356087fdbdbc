//! Conversation domain: messages, the conversation aggregate, and its
//! persistence trait.

pub mod message;
pub mod model;
pub mod repository;

pub use message::{Message, MessageRole, WorkflowStep, WorkflowStepStatus};
pub use model::{truncate_chars, Conversation, NEW_SESSION_TITLE, TITLE_PREVIEW_MAX};
pub use repository::ConversationRepository;
