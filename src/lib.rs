pub mod config;
pub mod engine;
pub mod error;
pub mod llm;

// Re-export main types for easier access
pub use config::Config;
pub use engine::{
    Decomposition,
    Orchestrator,
    OrchestratorSettings,
    RunReport,
    SubTask,
    SubTaskKind,
    WorkerResult
};
pub use error::{GatewayError, OrchestratorError, OrchestratorResult};
pub use llm::{LlmClient, ModelGateway, RetryPolicy};
