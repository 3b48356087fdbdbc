//! Unified path management for sola data files.
//!
//! All durable client data lives under the platform config directory:
//!
//! ```text
//! ~/.config/sola/
//! ├── app_state.toml        # Application state (explicit load/save)
//! ├── conversations/        # One TOML file per conversation
//! │   └── active_conversation   # Pointer to the last active conversation
//! └── tasks/                # One TOML file per scheduled task
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find platform config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path resolution for sola.
pub struct SolaPaths;

impl SolaPaths {
    /// Returns the sola configuration directory (e.g. `~/.config/sola/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("sola"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Directory holding conversation files.
    pub fn conversations_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("conversations"))
    }

    /// Directory holding scheduled task files.
    pub fn tasks_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("tasks"))
    }

    /// Application state file.
    pub fn app_state_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("app_state.toml"))
    }
}
