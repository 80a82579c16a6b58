// src/services/pipeline/mod.rs
//
// Document-processing pipeline: agents, registry, stage sequencer and the
// orchestrator facade the API layer talks to.

pub mod agent;
pub mod agents;
pub mod errors;
pub mod orchestrator;
pub mod registry;
pub mod sequencer;
pub mod types;

pub use agent::DocumentAgent;
pub use errors::PipelineError;
pub use orchestrator::{create_orchestrator, DocumentOrchestrator};
pub use registry::AgentRegistry;
pub use sequencer::StageSequencer;
pub use types::{
    AgentOutput, AgentState, AgentStatus, Capability, PipelineConfig, PipelineResult, StageError,
};
