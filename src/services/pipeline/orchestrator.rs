// src/services/pipeline/orchestrator.rs
//
// Defines the `DocumentOrchestrator` driving documents through the staged
// pipeline.
//
// The orchestrator enforces a sequential execution model where each stage
// must complete successfully before the next begins. Stage failures are
// recovered locally: the run halts at its last successful status and the
// failure is returned inside the `PipelineResult`, never thrown.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Decision, FinancialDocument};

use super::agents::{
    ApprovalAgent, ClassificationAgent, ComplianceAgent, ExtractionAgent, MatchingAgent,
    RiskAssessmentAgent,
};
use super::errors::PipelineError;
use super::registry::AgentRegistry;
use super::sequencer::{StageDisposition, StageSequencer};
use super::types::{AgentStatus, PipelineConfig, PipelineResult, StageError};

/// Process-wide facade over the registry and sequencer; the only component
/// the API routes touch. Constructed once at startup and shared by handle.
pub struct DocumentOrchestrator {
    registry: Arc<AgentRegistry>,
    sequencer: StageSequencer,
    config: PipelineConfig,
}

impl DocumentOrchestrator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        sequencer: StageSequencer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            sequencer,
            config,
        }
    }

    /// Drive a document through the pipeline to completion or halt.
    ///
    /// Stage failures, timeouts and configuration errors all come back
    /// inside `PipelineResult.errors`; the only direct error is a
    /// caller-contract violation (document with a nil id). Documents already
    /// partway through the pipeline resume from their current status;
    /// documents in a terminal status complete immediately with zero
    /// decisions.
    #[instrument(skip(self, document), fields(document_id = %document.id, tenant_id = %document.tenant_id))]
    pub async fn process_document(
        &self,
        mut document: FinancialDocument,
    ) -> Result<PipelineResult, PipelineError> {
        if document.id.is_nil() {
            return Err(PipelineError::InvalidDocument(
                "document id is required".to_string(),
            ));
        }

        let trace_id = Uuid::new_v4();
        let run_start = Instant::now();
        let mut decisions: Vec<Decision> = Vec::new();
        let mut errors: Vec<StageError> = Vec::new();

        info!(trace_id = %trace_id, status = %document.status, "Starting pipeline run");

        while let Some(rule) = self.sequencer.next_stage(document.status, &decisions) {
            let capability = rule.capability;
            let agents = match self.registry.resolve(capability) {
                Ok(agents) => agents,
                Err(e) => {
                    // Configuration error: fatal to the run, still returned
                    // as a structured error so callers get a well-formed
                    // response.
                    error!(trace_id = %trace_id, %capability, "Stage resolution failed: {}", e);
                    errors.push(StageError {
                        stage: capability,
                        agent: None,
                        message: e.to_string(),
                        fatal: true,
                    });
                    break;
                }
            };
            // Single-agent-per-capability is the expected configuration; run
            // the first match and record only its decision.
            let agent = Arc::clone(&agents[0]);
            let agent_name = agent.name().to_string();

            debug!(trace_id = %trace_id, %capability, agent = %agent_name, "Executing stage");
            self.registry.mark_processing(agent.id());
            let stage_start = Instant::now();
            let run = timeout(
                Duration::from_millis(self.config.stage_timeout_ms),
                agent.run(&document, &decisions),
            )
            .await;
            let latency_ms = stage_start.elapsed().as_millis() as u64;

            let output = match run {
                Err(_) => {
                    self.registry.record_run(agent.id(), latency_ms, false);
                    let e = PipelineError::StageTimeout {
                        capability,
                        timeout_ms: self.config.stage_timeout_ms,
                    };
                    error!(trace_id = %trace_id, %capability, agent = %agent_name, "{}", e);
                    errors.push(StageError {
                        stage: capability,
                        agent: Some(agent_name),
                        message: e.to_string(),
                        fatal: true,
                    });
                    break;
                }
                Ok(Err(e)) => {
                    self.registry.record_run(agent.id(), latency_ms, false);
                    error!(trace_id = %trace_id, %capability, agent = %agent_name, "Stage failed: {}", e);
                    errors.push(StageError {
                        stage: capability,
                        agent: Some(agent_name),
                        message: e.to_string(),
                        fatal: true,
                    });
                    break;
                }
                Ok(Ok(output)) => output,
            };

            let confidence = output.decision.confidence_score;
            if !(0.0..=1.0).contains(&confidence) || confidence.is_nan() {
                // Contract violation: report, never clamp.
                self.registry.record_run(agent.id(), latency_ms, false);
                let e = PipelineError::ContractViolation {
                    agent: agent_name.clone(),
                    message: format!("confidence score {} outside [0, 1]", confidence),
                };
                error!(trace_id = %trace_id, %capability, "{}", e);
                errors.push(StageError {
                    stage: capability,
                    agent: Some(agent_name),
                    message: e.to_string(),
                    fatal: true,
                });
                break;
            }

            self.registry.record_run(agent.id(), latency_ms, true);
            document = output.document;
            let outcome = output.decision.outcome.clone();
            decisions.push(output.decision);

            match self.sequencer.disposition(rule, &outcome) {
                StageDisposition::Continue { new_status } => {
                    if let Some(status) = new_status {
                        document.status = status;
                        document.touch();
                    }
                }
                StageDisposition::ContinueWithAdvisory { new_status } => {
                    warn!(trace_id = %trace_id, %capability, "Stage raised advisory flag, continuing");
                    errors.push(StageError {
                        stage: capability,
                        agent: Some(agent_name),
                        message: format!("{} stage flagged the document", capability),
                        fatal: false,
                    });
                    if let Some(status) = new_status {
                        document.status = status;
                        document.touch();
                    }
                }
                StageDisposition::Halt { new_status } => {
                    info!(trace_id = %trace_id, %capability, outcome = %outcome, new_status = %new_status, "Stage halted the run");
                    document.status = new_status;
                    document.touch();
                    break;
                }
            }
        }

        let duration_ms = run_start.elapsed().as_millis() as u64;
        info!(
            trace_id = %trace_id,
            status = %document.status,
            stages = decisions.len(),
            errors = errors.len(),
            "Pipeline run completed in {}ms",
            duration_ms
        );

        Ok(PipelineResult {
            document_id: document.id,
            trace_id,
            status: document.status,
            decisions,
            duration_ms,
            errors,
        })
    }

    /// Point-in-time view of every registered agent.
    pub fn registered_agents(&self) -> Vec<AgentStatus> {
        self.registry.snapshot()
    }

    /// Map an agent id to its display name, for response shaping.
    pub fn agent_name(&self, agent_id: Uuid) -> Option<String> {
        self.registry.agent_name(agent_id)
    }
}

/// Build the standard orchestrator with the six built-in agents registered.
/// Called once at startup; the result is shared through `AppState`.
pub fn create_orchestrator(config: &Config) -> Result<DocumentOrchestrator, PipelineError> {
    let pipeline_config = PipelineConfig::from(config);
    let registry = Arc::new(AgentRegistry::new());

    registry.register(Arc::new(ExtractionAgent::new()))?;
    registry.register(Arc::new(ClassificationAgent::new()))?;
    registry.register(Arc::new(ComplianceAgent::new(
        pipeline_config.require_vendor_tax_id,
    )))?;
    registry.register(Arc::new(MatchingAgent::new(
        pipeline_config.match_tolerance_pct,
    )))?;
    registry.register(Arc::new(RiskAssessmentAgent::new(
        pipeline_config.high_risk_amount,
    )))?;
    registry.register(Arc::new(ApprovalAgent::new(
        pipeline_config.auto_approve_limit,
    )))?;

    info!("Pipeline orchestrator created with {} agents", registry.len());

    Ok(DocumentOrchestrator::new(
        registry,
        StageSequencer::standard(),
        pipeline_config,
    ))
}
