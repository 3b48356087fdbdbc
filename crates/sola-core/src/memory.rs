//! Long-term memory store seam.
//!
//! On successful finalization of a streamed turn the completed exchange is
//! persisted to a long-term memory system. Persistence is best-effort:
//! failures are logged, never surfaced to the user, and never block UI
//! state transitions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One completed user/assistant exchange, ready for long-term storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryExchange {
    /// Conversation the exchange belongs to.
    pub conversation_id: String,
    /// The user message that opened the turn.
    pub user_text: String,
    /// The final assistant content.
    pub assistant_text: String,
    /// Millisecond timestamp distinguishing exchanges within a conversation.
    pub timestamp_ms: i64,
}

impl MemoryExchange {
    /// Builds an exchange stamped with the current time.
    pub fn new(
        conversation_id: impl Into<String>,
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Storage key: conversation id plus the timestamp component.
    pub fn key(&self) -> String {
        format!("{}-{}", self.conversation_id, self.timestamp_ms)
    }
}

/// Trait for persisting completed exchanges to a long-term memory system.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Commits one exchange. Implementations should be quick to fail;
    /// callers only log the error.
    async fn commit(&self, exchange: &MemoryExchange) -> Result<(), String>;
}

/// A no-op implementation for when no memory backend is configured.
pub struct NoOpMemoryStore;

#[async_trait]
impl MemoryStore for NoOpMemoryStore {
    async fn commit(&self, _exchange: &MemoryExchange) -> Result<(), String> {
        // No-op: report success without storing anything
        Ok(())
    }
}
