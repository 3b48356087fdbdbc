//! Atomic TOML file operations.
//!
//! A thin primitive the repositories build on: every save goes through a
//! temporary file, is fsynced, and atomically renamed into place, so a
//! crash mid-write never leaves a torn file behind.

use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

/// A handle to one TOML file with atomic write semantics.
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a handle for the given path. The file need not exist yet.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    /// The path this handle operates on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let data = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(data))
    }

    /// Serializes and saves `data` atomically (tmp file + fsync + rename).
    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(data).context("Failed to serialize to TOML")?;
        let tmp_path = self.path.with_extension("toml.tmp");

        {
            let mut tmp = File::create(&tmp_path)
                .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
            tmp.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
            tmp.sync_all()
                .with_context(|| format!("Failed to sync {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to move {} into place", tmp_path.display()))?;
        Ok(())
    }

    /// Deletes the file. Missing files are not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to remove {}", self.path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = AtomicTomlFile::<Sample>::new(dir.path().join("sample.toml"));

        assert!(file.load().unwrap().is_none());

        let data = Sample {
            name: "sola".to_string(),
            count: 3,
        };
        file.save(&data).unwrap();
        assert_eq!(file.load().unwrap(), Some(data));
    }

    #[test]
    fn test_save_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = AtomicTomlFile::<Sample>::new(dir.path().join("a/b/sample.toml"));
        file.save(&Sample {
            name: "x".to_string(),
            count: 0,
        })
        .unwrap();
        assert!(file.path().exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = AtomicTomlFile::<Sample>::new(dir.path().join("sample.toml"));
        assert!(file.remove().is_ok());
        file.save(&Sample {
            name: "x".to_string(),
            count: 1,
        })
        .unwrap();
        assert!(file.remove().is_ok());
        assert!(file.load().unwrap().is_none());
    }
}
