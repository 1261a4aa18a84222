mod parallel;
pub mod prompts;
mod task;
mod workflow;

pub use parallel::WorkerPool;
pub use task::{Decomposition, SubTask, SubTaskKind, WorkerResult};
pub use workflow::{Orchestrator, OrchestratorSettings, RunReport};
