use serde::{Serialize, Deserialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Connection settings for the language-model service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Name of the environment variable holding the access credential
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub user_agent: String,
}

/// Model identifiers used by each pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub decomposition: String,
    pub worker: String,
    pub synthesis: String,
}

/// Output budgets and prompt options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub worker_max_tokens: u32,
    pub synthesis_max_tokens: u32,
    pub worker_system_prompt: Option<String>,
}

/// Backoff settings for rate-limited calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            models: ModelConfig::default(),
            generation: GenerationConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.together.xyz/v1".to_string(),
            api_key_env: "TOGETHER_API_KEY".to_string(),
            timeout_seconds: 120,
            temperature: 0.7,
            user_agent: format!("taskweave/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            decomposition: "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo".to_string(),
            worker: "Qwen/Qwen2.5-Coder-32B-Instruct".to_string(),
            synthesis: "meta-llama/Llama-3.3-70B-Instruct-Turbo".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            worker_max_tokens: 2000,
            synthesis_max_tokens: 4000,
            worker_system_prompt: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}
