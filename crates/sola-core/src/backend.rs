//! Fallback backend seam.
//!
//! The HTTP request/response surface the session uses when the socket is
//! unavailable, plus the skills endpoints. Implementations live at the
//! network edge; the trait keeps the session testable without one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry of the skills listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Synchronous request/response surface of the orchestrator.
///
/// Errors are plain strings; the session renders them as a
/// `Backend Error: <detail>` assistant message and never retries.
#[async_trait]
pub trait FallbackBackend: Send + Sync {
    /// Executes a backend command, returning its plain-text result.
    async fn execute_command(&self, text: &str, project: Option<&str>)
        -> Result<String, String>;

    /// Sends chat text, returning the whole response in one piece.
    async fn speak(&self, text: &str, project: Option<&str>) -> Result<String, String>;

    /// Lists the skills the backend exposes.
    async fn list_skills(&self) -> Result<Vec<SkillInfo>, String>;

    /// Runs one skill with the given input.
    async fn execute_skill(&self, skill_id: &str, input: &str) -> Result<String, String>;
}
