// src/engine/prompts.rs
use super::task::{SubTask, WorkerResult};

pub fn decomposition_prompt(task: &str) -> String {
    format!(
        "Analyze this task and break it down into 2-3 distinct approaches:\n\
         Task: {task}\n\n\
         Provide a detailed analysis and 2-3 subtasks as JSON, each with a kind:\n\
         - 'plan': a detailed plan without solving the task.\n\
         - 'code_or_solve': a technical solution.\n\
         - 'test': a test plan.\n"
    )
}

pub fn worker_prompt(task: &str, subtask: &SubTask) -> String {
    format!(
        "Generate content based on:\n\
         Original task: {task}\n\
         Subtask kind: {kind}\n\
         Guidelines: {description}\n",
        kind = subtask.kind,
        description = subtask.description,
    )
}

/// Render worker outputs in subtask order, each labeled with its kind
pub fn format_worker_results(results: &[WorkerResult]) -> String {
    results
        .iter()
        .map(|r| format!("--- RESULT ({}) ---\n{}", r.subtask.kind, r.output))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn synthesis_prompt(task: &str, results: &[WorkerResult]) -> String {
    format!(
        "Given the task: {task}\n\
         And the following partial results:\n\
         {results}\n\n\
         Synthesize a complete and coherent final answer.\n",
        results = format_worker_results(results),
    )
}
