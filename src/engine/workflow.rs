// src/engine/workflow.rs
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use tracing::{info, error};

use crate::config::Config;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::llm::LlmClient;
use super::parallel::WorkerPool;
use super::prompts;
use super::task::{Decomposition, WorkerResult};

/// Models and budgets for each stage
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub decomposition_model: String,
    pub worker_model: String,
    pub synthesis_model: String,
    pub worker_max_tokens: u32,
    pub synthesis_max_tokens: u32,
    pub worker_system_prompt: Option<String>,
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            decomposition_model: config.models.decomposition.clone(),
            worker_model: config.models.worker.clone(),
            synthesis_model: config.models.synthesis.clone(),
            worker_max_tokens: config.generation.worker_max_tokens,
            synthesis_max_tokens: config.generation.synthesis_max_tokens,
            worker_system_prompt: config.generation.worker_system_prompt.clone(),
        }
    }
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub task: String,
    pub decomposition: Decomposition,
    pub worker_results: Vec<WorkerResult>,
    pub answer: String,
}

/// Decompose, dispatch workers concurrently, synthesize
pub struct Orchestrator {
    client: Arc<LlmClient>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(client: Arc<LlmClient>, settings: OrchestratorSettings) -> Self {
        Self { client, settings }
    }

    /// Run the pipeline and return the final answer
    pub async fn run(&self, task: &str) -> OrchestratorResult<String> {
        self.run_detailed(task).await.map(|report| report.answer)
    }

    /// Run the pipeline and keep the intermediate results
    pub async fn run_detailed(&self, task: &str) -> OrchestratorResult<RunReport> {
        if task.trim().is_empty() {
            return Err(OrchestratorError::validation("Task text must not be empty"));
        }

        info!("Starting workflow for: {}", task);

        let decomposition = self.decompose(task).await
            .map_err(|e| stage_failed("decompose", e))?;

        info!("Task decomposed into {} subtasks", decomposition.subtasks.len());

        let workers = WorkerPool::new(
            self.client.clone(),
            self.settings.worker_model.clone(),
            self.settings.worker_max_tokens,
        )
        .with_system_prompt(self.settings.worker_system_prompt.clone());

        let worker_results = workers.dispatch(task, &decomposition.subtasks).await
            .map_err(|e| stage_failed("dispatch", e))?;

        info!("Synthesizing {} worker results", worker_results.len());

        let answer = self.synthesize(task, &worker_results).await
            .map_err(|e| stage_failed("synthesize", e))?;

        Ok(RunReport {
            task: task.to_string(),
            decomposition,
            worker_results,
            answer,
        })
    }

    async fn decompose(&self, task: &str) -> OrchestratorResult<Decomposition> {
        let value = self.client
            .generate_structured(
                &prompts::decomposition_prompt(task),
                &Decomposition::json_schema(),
                &self.settings.decomposition_model,
            )
            .await?;

        Decomposition::from_value(value)
    }

    async fn synthesize(&self, task: &str, results: &[WorkerResult]) -> OrchestratorResult<String> {
        self.client
            .generate_text(
                &prompts::synthesis_prompt(task, results),
                &self.settings.synthesis_model,
                None,
                self.settings.synthesis_max_tokens,
            )
            .await
    }
}

fn stage_failed(stage: &str, e: OrchestratorError) -> OrchestratorError {
    error!("Stage {} failed: {}", stage, e);
    e
}
