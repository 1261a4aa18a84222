// src/llm/together.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use tracing::debug;

use super::{ChatRequest, ModelGateway};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, OrchestratorError, OrchestratorResult};

/// Resolve the access credential: an explicit value wins, otherwise the
/// named environment variable. Empty values count as missing.
pub fn resolve_api_key(explicit: Option<String>, env_var: &str) -> OrchestratorResult<String> {
    explicit
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|key| !key.trim().is_empty()))
        .ok_or_else(|| OrchestratorError::Configuration(
            format!("{} not found: pass an API key or set the environment variable", env_var)
        ))
}

/// Gateway for an OpenAI-compatible chat-completions endpoint (Together AI by default)
#[derive(Clone)]
pub struct TogetherGateway {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl TogetherGateway {
    /// Create a gateway. Fails before any network activity when no
    /// credential can be found.
    pub fn new(config: &GatewayConfig, api_key: Option<String>) -> OrchestratorResult<Self> {
        let api_key = resolve_api_key(api_key, &config.api_key_env)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| OrchestratorError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify_status(status: StatusCode, body: String) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        GatewayError::RateLimited(body)
    } else {
        GatewayError::Http {
            status: status.as_u16(),
            message: body,
        }
    }
}

#[async_trait]
impl ModelGateway for TogetherGateway {
    async fn complete(&self, request: ChatRequest) -> Result<String, GatewayError> {
        debug!(
            "POST {} (model={}, messages={}, max_tokens={:?})",
            self.endpoint, request.model, request.messages.len(), request.max_tokens
        );

        let response = self.client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        completion.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GatewayError::EmptyResponse(request.model))
    }
}
