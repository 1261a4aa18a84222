// src/engine/parallel.rs
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, debug, error};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::llm::LlmClient;
use super::prompts;
use super::task::{SubTask, WorkerResult};

/// Fans subtasks out to concurrent worker calls
pub struct WorkerPool {
    client: Arc<LlmClient>,
    model: String,
    max_tokens: u32,
    system_prompt: Option<String>,
}

impl WorkerPool {
    pub fn new(client: Arc<LlmClient>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    /// Run one worker per subtask concurrently.
    ///
    /// Every call is issued before any is awaited. Results come back in
    /// subtask order whatever order the calls finish in. The first failure
    /// aborts the whole group.
    pub async fn dispatch(&self, task: &str, subtasks: &[SubTask]) -> OrchestratorResult<Vec<WorkerResult>> {
        if subtasks.is_empty() {
            info!("No subtasks to dispatch");
            return Ok(Vec::new());
        }

        info!("Dispatching {} workers on {}", subtasks.len(), self.model);

        let mut workers = JoinSet::new();

        for (index, subtask) in subtasks.iter().enumerate() {
            let client = self.client.clone();
            let prompt = prompts::worker_prompt(task, subtask);
            let model = self.model.clone();
            let system_prompt = self.system_prompt.clone();
            let max_tokens = self.max_tokens;

            workers.spawn(async move {
                let output = client
                    .generate_text(&prompt, &model, system_prompt.as_deref(), max_tokens)
                    .await;
                (index, output)
            });
        }

        let mut outputs: Vec<Option<String>> = vec![None; subtasks.len()];

        while let Some(joined) = workers.join_next().await {
            let (index, output) = joined
                .map_err(|e| OrchestratorError::Unexpected(format!("Worker task did not complete: {}", e)))?;

            match output {
                Ok(text) => {
                    debug!("Worker {} ({}) finished", index, subtasks[index].kind);
                    outputs[index] = Some(text);
                }
                Err(e) => {
                    error!("Worker {} ({}) failed: {}", index, subtasks[index].kind, e);
                    return Err(e);
                }
            }
        }

        subtasks
            .iter()
            .zip(outputs)
            .map(|(subtask, output)| {
                output
                    .map(|output| WorkerResult { subtask: subtask.clone(), output })
                    .ok_or_else(|| OrchestratorError::Unexpected(
                        format!("Worker for {} produced no result", subtask.kind)
                    ))
            })
            .collect()
    }
}
