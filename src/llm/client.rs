// src/llm/client.rs
use std::sync::Arc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{ChatMessage, ChatRequest, ModelGateway, ResponseFormat, RetryPolicy, TogetherGateway};
use crate::config::Config;
use crate::error::{OrchestratorError, OrchestratorResult};

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("valid regex")
});

/// Client wrapper used by the orchestrator for every model call
#[derive(Clone)]
pub struct LlmClient {
    gateway: Arc<dyn ModelGateway>,
    retry: RetryPolicy,
    temperature: f32,
}

impl LlmClient {
    /// Build a client against the configured HTTP gateway
    pub fn from_config(config: &Config, api_key: Option<String>) -> OrchestratorResult<Self> {
        let gateway = TogetherGateway::new(&config.gateway, api_key)?;
        Ok(Self::with_gateway(Arc::new(gateway), config))
    }

    /// Build a client on top of any gateway implementation
    pub fn with_gateway(gateway: Arc<dyn ModelGateway>, config: &Config) -> Self {
        Self {
            gateway,
            retry: RetryPolicy::from_config(&config.retry),
            temperature: config.gateway.temperature,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Single-turn generation, optionally primed with a system prompt
    pub async fn generate_text(
        &self,
        prompt: &str,
        model: &str,
        system_prompt: Option<&str>,
        max_tokens: u32,
    ) -> OrchestratorResult<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatRequest {
            model: model.to_string(),
            messages,
            temperature: self.temperature,
            max_tokens: Some(max_tokens),
            response_format: None,
        };

        self.retry
            .execute("generate_text", || self.gateway.complete(request.clone()))
            .await
    }

    /// Generation constrained to `schema`; the reply is parsed as JSON.
    /// Gateway failures are `LlmCall`, unparseable replies are `Validation`.
    pub async fn generate_structured(&self, prompt: &str, schema: &Value, model: &str) -> OrchestratorResult<Value> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: None,
            response_format: Some(ResponseFormat::json_object(schema.clone())),
        };

        let raw = self.retry
            .execute("generate_structured", || self.gateway.complete(request.clone()))
            .await?;

        debug!("Structured response: {} bytes", raw.len());
        parse_json_reply(&raw)
    }
}

/// Parse a model reply as JSON, tolerating a Markdown code fence around it
pub(crate) fn parse_json_reply(raw: &str) -> OrchestratorResult<Value> {
    let body = FENCED_JSON
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    serde_json::from_str(body)
        .map_err(|e| OrchestratorError::invalid_json("Failed to parse structured response", e))
}
