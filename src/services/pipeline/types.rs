// src/services/pipeline/types.rs
//
// Pipeline Type Definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Decision, DocumentStatus, FinancialDocument};

/// Stage roles an agent can declare it services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Extraction,
    Classification,
    Compliance,
    Matching,
    RiskAssessment,
    Approval,
}

impl Capability {
    /// Human-readable stage label used in `Decision.action`.
    pub fn action_label(self) -> &'static str {
        match self {
            Capability::Extraction => "Extraction",
            Capability::Classification => "Classification",
            Capability::Compliance => "Compliance",
            Capability::Matching => "Matching",
            Capability::RiskAssessment => "Risk Assessment",
            Capability::Approval => "Approval",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::Extraction => "extraction",
            Capability::Classification => "classification",
            Capability::Compliance => "compliance",
            Capability::Matching => "matching",
            Capability::RiskAssessment => "risk_assessment",
            Capability::Approval => "approval",
        };
        write!(f, "{}", s)
    }
}

/// Runtime state of a registered agent, for health-check introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Idle,
    Processing,
    Error,
}

/// Registry-maintained runtime descriptor per registered agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub agent_id: Uuid,
    pub agent_name: String,
    pub capabilities: Vec<Capability>,
    pub status: AgentState,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub processed_count: u64,
    pub average_latency_ms: f64,
}

/// What one agent run produced: the audit decision plus the (possibly
/// mutated) document to carry forward.
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub decision: Decision,
    pub document: FinancialDocument,
}

/// A stage-level failure descriptor collected into `PipelineResult.errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageError {
    pub stage: Capability,
    pub agent: Option<String>,
    pub message: String,
    /// Fatal entries halted the run; non-fatal ones are advisory (e.g. a
    /// risk "flagged" outcome the run continued past).
    pub fatal: bool,
}

/// Aggregate outcome of one `process_document` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub document_id: Uuid,
    /// Unique per run; correlates logs and decisions.
    pub trace_id: Uuid,
    pub status: DocumentStatus,
    /// One entry per stage actually executed this run, in execution order.
    pub decisions: Vec<Decision>,
    pub duration_ms: u64,
    pub errors: Vec<StageError>,
}

/// Tunables for the orchestrator and its built-in agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub stage_timeout_ms: u64,
    pub auto_approve_limit: f64,
    pub match_tolerance_pct: f64,
    pub high_risk_amount: f64,
    pub require_vendor_tax_id: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_ms: 30_000,
            auto_approve_limit: 5_000.0,
            match_tolerance_pct: 0.5,
            high_risk_amount: 50_000.0,
            require_vendor_tax_id: false,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            stage_timeout_ms: config.stage_timeout_ms,
            auto_approve_limit: config.auto_approve_limit,
            match_tolerance_pct: config.match_tolerance_pct,
            high_risk_amount: config.high_risk_amount,
            require_vendor_tax_id: config.require_vendor_tax_id,
        }
    }
}
