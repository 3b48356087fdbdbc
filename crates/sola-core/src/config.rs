//! Backend endpoint configuration.
//!
//! The single environment-provided backend base URL is the only
//! configuration surface of the protocol core; both the socket and every
//! HTTP endpoint are derived from it.

use std::env;

/// Environment variable naming the backend base URL.
pub const BACKEND_URL_ENV: &str = "SOLA_BACKEND_URL";

/// Default backend for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8800";

/// Resolved backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    base_url: String,
}

impl BackendConfig {
    /// Creates a config from an explicit base URL. A trailing slash is
    /// stripped so endpoint joins stay predictable.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Loads the base URL from `SOLA_BACKEND_URL`, falling back to the
    /// local development default.
    pub fn from_env() -> Self {
        let base_url =
            env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        Self::new(base_url)
    }

    /// The HTTP base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The WebSocket URL, derived by swapping the scheme.
    pub fn socket_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            format!("ws://{}", self.base_url)
        };
        format!("{}/ws", ws_base)
    }

    /// Joins a path onto the HTTP base.
    pub fn http_endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Command-execution fallback endpoint.
    pub fn command_endpoint(&self) -> String {
        self.http_endpoint("api/command")
    }

    /// Speak fallback endpoint.
    pub fn speak_endpoint(&self) -> String {
        self.http_endpoint("api/speak")
    }

    /// Skills listing endpoint.
    pub fn skills_endpoint(&self) -> String {
        self.http_endpoint("api/skills")
    }

    /// Skill execution endpoint for one skill id.
    pub fn skill_execute_endpoint(&self, skill_id: &str) -> String {
        self.http_endpoint(&format!("api/skills/{}", skill_id))
    }

    /// Long-term memory commit endpoint.
    pub fn memory_endpoint(&self) -> String {
        self.http_endpoint("api/memory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_swaps_scheme() {
        assert_eq!(
            BackendConfig::new("http://localhost:8800").socket_url(),
            "ws://localhost:8800/ws"
        );
        assert_eq!(
            BackendConfig::new("https://sola.example.com").socket_url(),
            "wss://sola.example.com/ws"
        );
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let config = BackendConfig::new("http://localhost:8800/");
        assert_eq!(config.command_endpoint(), "http://localhost:8800/api/command");
        assert_eq!(config.socket_url(), "ws://localhost:8800/ws");
    }

    #[test]
    fn test_endpoints() {
        let config = BackendConfig::new("http://h:1");
        assert_eq!(config.speak_endpoint(), "http://h:1/api/speak");
        assert_eq!(config.skills_endpoint(), "http://h:1/api/skills");
        assert_eq!(
            config.skill_execute_endpoint("summarize"),
            "http://h:1/api/skills/summarize"
        );
        assert_eq!(config.memory_endpoint(), "http://h:1/api/memory");
    }
}
