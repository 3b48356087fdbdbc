//! Conversation repository trait.
//!
//! Defines the interface for conversation persistence operations.

use super::model::Conversation;
use anyhow::Result;
use async_trait::async_trait;

/// An abstract repository for managing conversation persistence.
///
/// This trait decouples the session layer from the specific storage
/// mechanism (e.g., TOML files, database).
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Finds a conversation by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Conversation))`: Conversation found
    /// - `Ok(None)`: Conversation not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, conversation_id: &str) -> Result<Option<Conversation>>;

    /// Saves a conversation to storage.
    async fn save(&self, conversation: &Conversation) -> Result<()>;

    /// Deletes a conversation from storage.
    async fn delete(&self, conversation_id: &str) -> Result<()>;

    /// Lists all stored conversations.
    async fn list_all(&self) -> Result<Vec<Conversation>>;

    /// Returns the id of the conversation that was active when the
    /// application last ran, if any.
    async fn active_conversation_id(&self) -> Result<Option<String>>;

    /// Records (or clears) the active conversation pointer.
    async fn set_active_conversation(&self, conversation_id: Option<&str>) -> Result<()>;
}
