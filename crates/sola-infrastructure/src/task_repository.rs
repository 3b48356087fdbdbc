//! TOML-file-based ScheduledTaskRepository implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use sola_core::schedule::{ScheduledTask, ScheduledTaskRepository};

use crate::paths::SolaPaths;
use crate::storage::AtomicTomlFile;

/// Stores each scheduled task as one TOML file under a base directory.
pub struct TomlScheduledTaskRepository {
    base_dir: PathBuf,
}

impl TomlScheduledTaskRepository {
    /// Creates a repository at the default location (`~/.config/sola/tasks`).
    pub async fn default_location() -> Result<Self> {
        let base_dir = SolaPaths::tasks_dir()
            .map_err(|e| anyhow::anyhow!("Failed to resolve tasks directory: {}", e))?;
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

    fn task_file(&self, task_id: &str) -> AtomicTomlFile<ScheduledTask> {
        AtomicTomlFile::new(self.base_dir.join(format!("{}.toml", task_id)))
    }
}

#[async_trait]
impl ScheduledTaskRepository for TomlScheduledTaskRepository {
    async fn find_by_id(&self, task_id: &str) -> Result<Option<ScheduledTask>> {
        self.task_file(task_id).load()
    }

    async fn save(&self, task: &ScheduledTask) -> Result<()> {
        self.task_file(&task.id).save(task)
    }

    async fn delete(&self, task_id: &str) -> Result<()> {
        self.task_file(task_id).remove()
    }

    async fn list_all(&self) -> Result<Vec<ScheduledTask>> {
        let mut tasks = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .with_context(|| format!("Failed to list {}", self.base_dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match AtomicTomlFile::<ScheduledTask>::new(path.clone()).load() {
                Ok(Some(task)) => tasks.push(task),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        "[TaskRepository] Skipping unreadable {}: {}",
                        path.display(),
                        err
                    );
                }
            }
        }

        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sola_core::schedule::{Recurrence, TaskPriority, TaskStatus};

    fn sample_task() -> ScheduledTask {
        ScheduledTask::new(
            "Water plants",
            "The ficus in particular",
            "sola",
            TaskPriority::Low,
            "18:00",
            Recurrence::Daily,
        )
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TomlScheduledTaskRepository::new(dir.path()).await.unwrap();

        let mut task = sample_task();
        repo.save(&task).await.unwrap();
        assert_eq!(repo.find_by_id(&task.id).await.unwrap(), Some(task.clone()));

        task.status = TaskStatus::Paused;
        repo.save(&task).await.unwrap();
        assert_eq!(
            repo.find_by_id(&task.id).await.unwrap().unwrap().status,
            TaskStatus::Paused
        );

        assert_eq!(repo.list_all().await.unwrap().len(), 1);

        repo.delete(&task.id).await.unwrap();
        assert!(repo.find_by_id(&task.id).await.unwrap().is_none());
        assert!(repo.list_all().await.unwrap().is_empty());
    }
}
