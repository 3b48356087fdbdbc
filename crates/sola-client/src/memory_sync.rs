//! HTTP-backed long-term memory store.
//!
//! Commits completed exchanges to the orchestrator's memory endpoint.
//! Configuration priority: explicit constructor arguments, then the
//! `SOLA_MEMORY_TOKEN` environment variable for the optional bearer token.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use sola_core::config::BackendConfig;
use sola_core::memory::{MemoryExchange, MemoryStore};

/// Environment variable holding the optional memory API token.
pub const MEMORY_TOKEN_ENV: &str = "SOLA_MEMORY_TOKEN";

const COMMIT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct CommitRequest<'a> {
    key: String,
    conversation_id: &'a str,
    user_text: &'a str,
    assistant_text: &'a str,
    timestamp_ms: i64,
}

/// Memory store that talks to the orchestrator's `/api/memory` endpoint.
#[derive(Clone)]
pub struct HttpMemoryStore {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpMemoryStore {
    /// Creates a store with explicit configuration.
    pub fn new(config: &BackendConfig, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.memory_endpoint(),
            api_token,
        }
    }

    /// Creates a store, picking the bearer token up from the environment.
    pub fn from_env(config: &BackendConfig) -> Self {
        let api_token = env::var(MEMORY_TOKEN_ENV).ok();
        tracing::debug!(
            "[MemoryStore] Initialized for {} (token: {})",
            config.memory_endpoint(),
            if api_token.is_some() { "present" } else { "none" }
        );
        Self::new(config, api_token)
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.api_token {
            request.header("Authorization", format!("Bearer {}", token))
        } else {
            request
        }
    }
}

#[async_trait]
impl MemoryStore for HttpMemoryStore {
    async fn commit(&self, exchange: &MemoryExchange) -> Result<(), String> {
        let body = CommitRequest {
            key: exchange.key(),
            conversation_id: &exchange.conversation_id,
            user_text: &exchange.user_text,
            assistant_text: &exchange.assistant_text,
            timestamp_ms: exchange.timestamp_ms,
        };

        let request = self
            .auth_request(self.client.post(&self.endpoint))
            .timeout(COMMIT_TIMEOUT)
            .json(&body);

        let response = request
            .send()
            .await
            .map_err(|err| format!("memory commit failed: {}", err))?;

        if !response.status().is_success() {
            return Err(format!(
                "memory commit rejected with HTTP {}",
                response.status().as_u16()
            ));
        }

        tracing::debug!("[MemoryStore] Committed exchange {}", body.key);
        Ok(())
    }
}
