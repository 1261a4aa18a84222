// src/config/mod.rs
mod schema;

use std::path::{Path, PathBuf};
use config::{Config as ConfigLoader, FileFormat};
use tracing::{info, warn};

pub use schema::{Config, GatewayConfig, GenerationConfig, ModelConfig, RetryConfig};

use crate::error::{OrchestratorResult, OrchestratorError};

/// Centralized configuration handling
impl Config {
    /// Load configuration from a file or fall back to the built-in defaults
    pub fn load(config_path: Option<&Path>) -> OrchestratorResult<Self> {
        info!("Loading configuration");

        let mut config_builder = ConfigLoader::builder();

        // Default configuration
        config_builder = config_builder.add_source(
            config::File::from_str(
                include_str!("../../config/default.toml"),
                FileFormat::Toml
            )
        );

        // User-provided configuration
        if let Some(path) = config_path {
            if path.exists() {
                config_builder = config_builder.add_source(config::File::from(path));
                info!("Loading user configuration from: {}", path.display());
            } else {
                warn!("Specified configuration file not found: {}", path.display());
            }
        } else {
            let default_path = Self::get_default_config_path();
            if default_path.exists() {
                config_builder = config_builder.add_source(config::File::from(default_path.as_path()));
                info!("Loading default configuration from: {}", default_path.display());
            } else {
                info!("No existing configuration found, using built-in defaults");
            }
        }

        // Environment variables, e.g. TASKWEAVE_RETRY__MAX_ATTEMPTS=5
        config_builder = config_builder.add_source(
            config::Environment::with_prefix("TASKWEAVE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
        );

        let config: Config = match config_builder.build() {
            Ok(c) => match c.try_deserialize() {
                Ok(config) => config,
                Err(e) => return Err(OrchestratorError::Configuration(format!("Failed to parse configuration: {}", e))),
            },
            Err(e) => return Err(OrchestratorError::Configuration(format!("Failed to build configuration: {}", e))),
        };

        config.validate()?;

        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(OrchestratorError::Configuration(
                "retry.max_attempts must be at least 1".to_string()
            ));
        }

        if self.retry.base_delay_ms == 0 {
            return Err(OrchestratorError::Configuration(
                "retry.base_delay_ms must be positive".to_string()
            ));
        }

        if self.generation.worker_max_tokens == 0 || self.generation.synthesis_max_tokens == 0 {
            return Err(OrchestratorError::Configuration(
                "token budgets must be positive".to_string()
            ));
        }

        if self.generation.synthesis_max_tokens <= self.generation.worker_max_tokens {
            return Err(OrchestratorError::Configuration(format!(
                "generation.synthesis_max_tokens ({}) must exceed generation.worker_max_tokens ({})",
                self.generation.synthesis_max_tokens, self.generation.worker_max_tokens
            )));
        }

        for (stage, model) in [
            ("decomposition", &self.models.decomposition),
            ("worker", &self.models.worker),
            ("synthesis", &self.models.synthesis),
        ] {
            if model.trim().is_empty() {
                return Err(OrchestratorError::Configuration(
                    format!("models.{} must not be empty", stage)
                ));
            }
        }

        if url::Url::parse(&self.gateway.base_url).is_err() {
            return Err(OrchestratorError::Configuration(
                format!("gateway.base_url is not a valid URL: {}", self.gateway.base_url)
            ));
        }

        Ok(())
    }

    /// Get the default configuration path
    pub fn get_default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taskweave/config.toml")
    }

    /// Write the default configuration to the default location
    pub fn init(force: bool) -> OrchestratorResult<PathBuf> {
        let config_path = Self::get_default_config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OrchestratorError::Configuration(
                    format!("Failed to create directory {}: {}", parent.display(), e)
                ))?;
        }

        if config_path.exists() && !force {
            return Err(OrchestratorError::Configuration(
                format!("Configuration already exists at {}. Use --force to overwrite.", config_path.display())
            ));
        }

        Config::default().save(&config_path)?;

        Ok(config_path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> OrchestratorResult<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| OrchestratorError::Configuration(format!("Failed to serialize configuration: {}", e)))?;

        std::fs::write(path, config_str)
            .map_err(|e| OrchestratorError::Configuration(
                format!("Failed to write configuration to {}: {}", path.display(), e)
            ))?;

        info!("Configuration saved to {}", path.display());

        Ok(())
    }
}
