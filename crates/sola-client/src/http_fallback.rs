//! HTTP fallback client.
//!
//! When the socket is down (or for the fast-path command prefixes) requests
//! go over plain HTTP request/response instead. The same client also serves
//! the skills listing and execution endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use sola_core::backend::{FallbackBackend, SkillInfo};
use sola_core::config::BackendConfig;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the HTTP fallback path.
///
/// The session renders these as a generic `Backend Error: <detail>`
/// assistant message; there is no automatic retry.
#[derive(Debug, Error)]
pub enum BackendHttpError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    /// The request never completed.
    #[error("{0}")]
    Network(String),
}

/// JSON body shared by the command and speak endpoints.
#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<&'a str>,
}

/// JSON body for skill execution.
#[derive(Serialize)]
struct SkillRequest<'a> {
    input: &'a str,
}

/// Request/response client for the orchestrator's HTTP surface.
pub struct HttpBackendClient {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackendClient {
    /// Creates a client against the given backend.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, config })
    }

    /// Executes a backend command and returns its plain-text result.
    pub async fn execute_command(
        &self,
        text: &str,
        project: Option<&str>,
    ) -> Result<String, BackendHttpError> {
        tracing::debug!("[HttpFallback] command: {}", text);
        self.post_text(&self.config.command_endpoint(), &TextRequest { text, project })
            .await
    }

    /// Sends chat text over HTTP and returns the whole response in one
    /// piece; no streaming on this path.
    pub async fn speak(&self, text: &str, project: Option<&str>) -> Result<String, BackendHttpError> {
        tracing::debug!("[HttpFallback] speak: {}", text);
        self.post_text(&self.config.speak_endpoint(), &TextRequest { text, project })
            .await
    }

    /// Lists the skills the backend exposes.
    pub async fn list_skills(&self) -> Result<Vec<SkillInfo>, BackendHttpError> {
        let response = self
            .client
            .get(self.config.skills_endpoint())
            .send()
            .await
            .map_err(|err| BackendHttpError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BackendHttpError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json()
            .await
            .map_err(|err| BackendHttpError::Network(format!("invalid skills listing: {}", err)))
    }

    /// Runs one skill with the given input and returns its result string.
    pub async fn execute_skill(
        &self,
        skill_id: &str,
        input: &str,
    ) -> Result<String, BackendHttpError> {
        self.post_text(
            &self.config.skill_execute_endpoint(skill_id),
            &SkillRequest { input },
        )
        .await
    }

    async fn post_text<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<String, BackendHttpError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| BackendHttpError::Network(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| BackendHttpError::Network(err.to_string()))?;

        if !status.is_success() {
            return Err(BackendHttpError::Status {
                status: status.as_u16(),
                detail: text,
            });
        }
        Ok(text)
    }
}

/// Trait adapter for the session layer; errors flatten to display strings.
#[async_trait]
impl FallbackBackend for HttpBackendClient {
    async fn execute_command(&self, text: &str, project: Option<&str>) -> Result<String, String> {
        HttpBackendClient::execute_command(self, text, project)
            .await
            .map_err(|err| err.to_string())
    }

    async fn speak(&self, text: &str, project: Option<&str>) -> Result<String, String> {
        HttpBackendClient::speak(self, text, project)
            .await
            .map_err(|err| err.to_string())
    }

    async fn list_skills(&self) -> Result<Vec<SkillInfo>, String> {
        HttpBackendClient::list_skills(self)
            .await
            .map_err(|err| err.to_string())
    }

    async fn execute_skill(&self, skill_id: &str, input: &str) -> Result<String, String> {
        HttpBackendClient::execute_skill(self, skill_id, input)
            .await
            .map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_omits_missing_project() {
        let body = serde_json::to_value(TextRequest {
            text: "hello",
            project: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "text": "hello" }));

        let body = serde_json::to_value(TextRequest {
            text: "hello",
            project: Some("garden"),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "text": "hello", "project": "garden" }));
    }

    #[test]
    fn test_error_display() {
        let err = BackendHttpError::Status {
            status: 502,
            detail: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: upstream down");
    }
}
