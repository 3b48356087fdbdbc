//! Conversation domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

/// Title given to a conversation before its first message is dispatched.
pub const NEW_SESSION_TITLE: &str = "New Session";

/// Maximum number of characters kept when deriving a title from the first
/// message.
pub const TITLE_PREVIEW_MAX: usize = 40;

/// A named, ordered sequence of messages.
///
/// Conversations are owned by the UI session and persisted across restarts.
/// Every message belongs to exactly one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier (UUID format).
    pub id: String,
    /// Human-readable conversation title.
    pub title: String,
    /// Timestamp when the conversation was created (ISO 8601 format).
    pub created_at: String,
    /// Timestamp when the conversation was last updated (ISO 8601 format).
    pub updated_at: String,
    /// Ordered message history.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation with the placeholder title.
    pub fn new() -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            title: NEW_SESSION_TITLE.to_string(),
            created_at: now.clone(),
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Appends a message and bumps the update timestamp.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// Returns a mutable reference to the message with the given id.
    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    /// Removes the message with the given id. Returns true if it existed.
    pub fn remove_message(&mut self, message_id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != message_id);
        let removed = self.messages.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Replaces the placeholder title with a preview of the given text.
    ///
    /// This happens exactly once: calls after the title has been set are
    /// no-ops, so later turns never rename the conversation.
    pub fn retitle_from(&mut self, text: &str) {
        if self.title != NEW_SESSION_TITLE {
            return;
        }
        let preview = truncate_chars(text.trim(), TITLE_PREVIEW_MAX);
        if !preview.is_empty() {
            self.title = preview;
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncates `text` to at most `max_chars` characters, appending an
/// ellipsis when anything was cut. Operates on character boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(max_chars).collect();
    preview.push('…');
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retitle_happens_exactly_once() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.title, NEW_SESSION_TITLE);

        conversation.retitle_from("What is the weather like today?");
        assert_eq!(conversation.title, "What is the weather like today?");

        conversation.retitle_from("Second message should not rename");
        assert_eq!(conversation.title, "What is the weather like today?");
    }

    #[test]
    fn test_retitle_truncates_long_first_message() {
        let mut conversation = Conversation::new();
        let long = "x".repeat(TITLE_PREVIEW_MAX * 2);
        conversation.retitle_from(&long);
        assert_eq!(conversation.title.chars().count(), TITLE_PREVIEW_MAX + 1);
        assert!(conversation.title.ends_with('…'));
    }

    #[test]
    fn test_remove_message() {
        let mut conversation = Conversation::new();
        let message = Message::user("hello");
        let id = message.id.clone();
        conversation.push_message(message);

        assert!(conversation.remove_message(&id));
        assert!(conversation.messages.is_empty());
        assert!(!conversation.remove_message(&id));
    }

    #[test]
    fn test_truncate_chars_respects_multibyte_boundaries() {
        let text = "日本語のテキストです";
        let preview = truncate_chars(text, 4);
        assert_eq!(preview, "日本語の…");
    }
}
