// src/llm/mod.rs
mod client;
mod retry;
mod together;

use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use serde_json::Value;

pub use client::LlmClient;
pub use retry::RetryPolicy;
pub use together::{resolve_api_key, TogetherGateway};

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Output constraint for structured generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    pub schema: Value,
}

impl ResponseFormat {
    pub fn json_object(schema: Value) -> Self {
        Self {
            format_type: "json_object".to_string(),
            schema,
        }
    }
}

/// A single chat-style generation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn is_structured(&self) -> bool {
        self.response_format.is_some()
    }

    /// Content of the last user message
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Text-generation capability backing every pipeline call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send one request and return the primary response text
    async fn complete(&self, request: ChatRequest) -> Result<String, GatewayError>;
}
