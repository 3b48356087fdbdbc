//! TOML-file-based ConversationRepository implementation.
//!
//! Directory structure:
//! ```text
//! base_dir/
//! ├── <conversation-id>.toml
//! ├── <conversation-id>.toml
//! └── active_conversation       # plain-text pointer file
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use sola_core::conversation::{Conversation, ConversationRepository};

use crate::paths::SolaPaths;
use crate::storage::AtomicTomlFile;

const ACTIVE_POINTER_FILE: &str = "active_conversation";

/// Stores each conversation as one TOML file under a base directory.
pub struct TomlConversationRepository {
    base_dir: PathBuf,
}

impl TomlConversationRepository {
    /// Creates a repository at the default location
    /// (`~/.config/sola/conversations`).
    pub async fn default_location() -> Result<Self> {
        let base_dir = SolaPaths::conversations_dir()
            .map_err(|e| anyhow::anyhow!("Failed to resolve conversations directory: {}", e))?;
        Self::new(base_dir).await
    }

    /// Creates a repository rooted at `base_dir`, creating it if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)
            .await
            .with_context(|| format!("Failed to create {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn conversation_file(&self, conversation_id: &str) -> AtomicTomlFile<Conversation> {
        AtomicTomlFile::new(self.base_dir.join(format!("{}.toml", conversation_id)))
    }

    fn pointer_path(&self) -> PathBuf {
        self.base_dir.join(ACTIVE_POINTER_FILE)
    }
}

#[async_trait]
impl ConversationRepository for TomlConversationRepository {
    async fn find_by_id(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        self.conversation_file(conversation_id).load()
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        self.conversation_file(&conversation.id).save(conversation)
    }

    async fn delete(&self, conversation_id: &str) -> Result<()> {
        self.conversation_file(conversation_id).remove()
    }

    async fn list_all(&self) -> Result<Vec<Conversation>> {
        let mut conversations = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .with_context(|| format!("Failed to list {}", self.base_dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match AtomicTomlFile::<Conversation>::new(path.clone()).load() {
                Ok(Some(conversation)) => conversations.push(conversation),
                Ok(None) => {}
                Err(err) => {
                    // One corrupt file must not hide every other conversation.
                    tracing::warn!(
                        "[ConversationRepository] Skipping unreadable {}: {}",
                        path.display(),
                        err
                    );
                }
            }
        }

        conversations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(conversations)
    }

    async fn active_conversation_id(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.pointer_path()).await {
            Ok(content) => {
                let id = content.trim().to_string();
                Ok(if id.is_empty() { None } else { Some(id) })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).context("Failed to read active conversation pointer"),
        }
    }

    async fn set_active_conversation(&self, conversation_id: Option<&str>) -> Result<()> {
        match conversation_id {
            Some(id) => fs::write(self.pointer_path(), id)
                .await
                .context("Failed to write active conversation pointer"),
            None => match fs::remove_file(self.pointer_path()).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err).context("Failed to clear active conversation pointer"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sola_core::conversation::Message;

    async fn repository() -> (tempfile::TempDir, TomlConversationRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = TomlConversationRepository::new(dir.path()).await.unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn test_save_find_roundtrip() {
        let (_dir, repo) = repository().await;

        let mut conversation = Conversation::new();
        conversation.push_message(Message::user("hello"));
        conversation.push_message(Message::assistant("hi"));
        repo.save(&conversation).await.unwrap();

        let loaded = repo.find_by_id(&conversation.id).await.unwrap().unwrap();
        assert_eq!(loaded, conversation);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let (_dir, repo) = repository().await;
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_sorted_by_creation() {
        let (_dir, repo) = repository().await;

        let mut first = Conversation::new();
        first.created_at = "2026-01-01T00:00:00Z".to_string();
        let mut second = Conversation::new();
        second.created_at = "2026-02-01T00:00:00Z".to_string();

        repo.save(&second).await.unwrap();
        repo.save(&first).await.unwrap();

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let (_dir, repo) = repository().await;
        let conversation = Conversation::new();
        repo.save(&conversation).await.unwrap();
        repo.delete(&conversation.id).await.unwrap();
        assert!(repo.find_by_id(&conversation.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_pointer_roundtrip() {
        let (_dir, repo) = repository().await;
        assert!(repo.active_conversation_id().await.unwrap().is_none());

        repo.set_active_conversation(Some("conv-9")).await.unwrap();
        assert_eq!(
            repo.active_conversation_id().await.unwrap().as_deref(),
            Some("conv-9")
        );

        repo.set_active_conversation(None).await.unwrap();
        assert!(repo.active_conversation_id().await.unwrap().is_none());
    }
}
