// src/services/pipeline/agent.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Decision, FinancialDocument};

use super::errors::PipelineError;
use super::types::{AgentOutput, Capability};

/// A single named processing unit in the document pipeline.
///
/// Implementations perform one unit of domain logic against a document and
/// produce a `Decision`, optionally mutating the document's extracted data
/// or status. `run` must be idempotent with respect to `reasoning` and
/// `outcome` for identical input (timestamps may differ) so audit trails
/// stay reproducible.
///
/// Agents that call out to slow external services must bound the call; the
/// orchestrator additionally enforces a per-stage timeout.
#[async_trait]
pub trait DocumentAgent: Send + Sync + std::fmt::Debug {
    fn id(&self) -> Uuid;

    fn name(&self) -> &str;

    /// Stage roles this agent can service.
    fn capabilities(&self) -> &[Capability];

    /// Process the document given the decision trail accumulated so far in
    /// this run. Fails with `PipelineError::AgentExecution` when no decision
    /// can be produced (e.g. a required field for this capability is
    /// missing).
    async fn run(
        &self,
        document: &FinancialDocument,
        trail: &[Decision],
    ) -> Result<AgentOutput, PipelineError>;
}
