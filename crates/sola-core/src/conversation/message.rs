//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles, workflow step annotations, and streaming state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

/// Status of a single workflow step attached to a command-style response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStepStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// One step of a command workflow, rendered by fronts as a progress list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Short human-readable label.
    pub label: String,
    /// Icon hint for the UI.
    pub icon: String,
    /// Current step status.
    pub status: WorkflowStepStatus,
}

impl WorkflowStep {
    /// Creates a step in the given status.
    pub fn new(label: impl Into<String>, icon: impl Into<String>, status: WorkflowStepStatus) -> Self {
        Self {
            label: label.into(),
            icon: icon.into(),
            status,
        }
    }
}

/// A single message in a conversation.
///
/// While `streaming` is true the content is append-only and mutable; once the
/// flag clears the message is finalized and must not change again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier (UUID format).
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The textual content of the message.
    pub content: String,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
    /// Optional label of the agent that produced this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// True while a streamed response is still accumulating.
    #[serde(default)]
    pub streaming: bool,
    /// Opaque provenance tag from the backend memory system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_commit: Option<String>,
    /// Ordered workflow steps for command-style responses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow_steps: Vec<WorkflowStep>,
}

impl Message {
    fn base(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            agent: None,
            streaming: false,
            memory_commit: None,
            workflow_steps: Vec::new(),
        }
    }

    /// Creates a finalized user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::base(MessageRole::User, content)
    }

    /// Creates a finalized assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::base(MessageRole::Assistant, content)
    }

    /// Creates an empty assistant placeholder that anchors a streamed
    /// response. The placeholder is visible immediately so the UI can show
    /// an in-progress indicator.
    pub fn streaming_placeholder() -> Self {
        let mut message = Self::base(MessageRole::Assistant, "");
        message.streaming = true;
        message
    }

    /// Creates an assistant message carrying a command result with its
    /// workflow steps.
    pub fn command_result(content: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        let mut message = Self::base(MessageRole::Assistant, content);
        message.workflow_steps = steps;
        message
    }

    /// Clears the streaming flag, sealing the content.
    pub fn finalize(&mut self) {
        self.streaming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_placeholder_is_empty_and_streaming() {
        let message = Message::streaming_placeholder();
        assert_eq!(message.role, MessageRole::Assistant);
        assert!(message.content.is_empty());
        assert!(message.streaming);
    }

    #[test]
    fn test_finalize_clears_streaming() {
        let mut message = Message::streaming_placeholder();
        message.content.push_str("done");
        message.finalize();
        assert!(!message.streaming);
        assert_eq!(message.content, "done");
    }

    #[test]
    fn test_serde_skips_empty_optionals() {
        let message = Message::user("hello");
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("agent").is_none());
        assert!(json.get("memory_commit").is_none());
        assert!(json.get("workflow_steps").is_none());
    }
}
