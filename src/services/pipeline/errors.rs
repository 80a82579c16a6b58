// src/services/pipeline/errors.rs
//
// Pipeline Error Types

use thiserror::Error;
use uuid::Uuid;

use super::types::Capability;

#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// A single agent could not complete its stage (bad input, internal
    /// fault). Recovered locally: the run halts at its last successful
    /// status and the failure is surfaced in `PipelineResult.errors`.
    #[error("Agent execution failed: {agent} - {message}")]
    AgentExecution { agent: String, message: String },

    #[error("Stage timeout: {capability} took longer than {timeout_ms}ms")]
    StageTimeout {
        capability: Capability,
        timeout_ms: u64,
    },

    /// Pipeline-configuration error, fatal to the run.
    #[error("No agent registered for capability: {0}")]
    NoAgentForCapability(Capability),

    #[error("Agent already registered: {agent_id} ({agent_name})")]
    DuplicateAgent { agent_id: Uuid, agent_name: String },

    /// An agent broke its contract (e.g. confidence score outside [0, 1]).
    /// Reported, never silently corrected.
    #[error("Agent contract violation: {agent} - {message}")]
    ContractViolation { agent: String, message: String },

    /// Caller-contract violation; the only error `process_document` returns
    /// directly instead of folding into the result.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl From<PipelineError> for crate::errors::AppError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::InvalidDocument(msg) => crate::errors::AppError::BadRequest(msg),
            PipelineError::DuplicateAgent {
                agent_id,
                agent_name,
            } => crate::errors::AppError::Conflict(format!(
                "Agent {} ({}) already registered",
                agent_id, agent_name
            )),
            other => {
                crate::errors::AppError::InternalServerErrorGeneric(other.to_string())
            }
        }
    }
}
