//! Application state persistence.
//!
//! The state store has two boundaries and nothing in between: `load()` once
//! at startup, `save()` on explicit commit actions. Components receive the
//! state by injection instead of reading storage ambiently.

use std::path::PathBuf;

use anyhow::Result;

use sola_core::app_state::AppState;

use crate::paths::SolaPaths;
use crate::storage::AtomicTomlFile;

/// Durable store for [`AppState`].
pub struct AppStateStore {
    file: AtomicTomlFile<AppState>,
}

impl AppStateStore {
    /// Creates a store at the default location (`~/.config/sola/app_state.toml`).
    pub fn default_location() -> Result<Self> {
        let path = SolaPaths::app_state_file()
            .map_err(|e| anyhow::anyhow!("Failed to resolve app state path: {}", e))?;
        Ok(Self::at_path(path))
    }

    /// Creates a store at an explicit path.
    pub fn at_path(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    /// Loads the state, falling back to defaults when the file is missing
    /// or unreadable. An unreadable file is logged, not fatal: losing panel
    /// flags beats refusing to start.
    pub fn load(&self) -> AppState {
        match self.file.load() {
            Ok(Some(state)) => state,
            Ok(None) => AppState::default(),
            Err(err) => {
                tracing::warn!("[AppStateStore] Falling back to defaults: {}", err);
                AppState::default()
            }
        }
    }

    /// Commits the state to disk.
    pub fn save(&self, state: &AppState) -> Result<()> {
        self.file.save(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = AppStateStore::at_path(dir.path().join("app_state.toml"));
        assert_eq!(store.load(), AppState::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = AppStateStore::at_path(dir.path().join("app_state.toml"));

        let mut state = AppState::default();
        state.voice_enabled = true;
        state.panels.scheduler = true;

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app_state.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        let store = AppStateStore::at_path(path);
        assert_eq!(store.load(), AppState::default());
    }
}
