// src/routes/agents.rs
//
// Agent pipeline endpoints. Handlers stay thin: expand the payload, call
// the orchestrator, shape the response. The JSON shapes here are frozen for
// existing callers; field names and optionality must not drift.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Decision, DocumentStatus, FinancialDocument};
use crate::services::document_builder::{self, DocumentPayload, InvoiceShorthand};
use crate::services::pipeline::{AgentState, AgentStatus, Capability, PipelineResult, StageError};
use crate::state::AppState;

// --- POST /api/agents/process ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    document: Option<DocumentPayload>,
    #[serde(flatten)]
    shorthand: InvoiceShorthand,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentSummary {
    id: Uuid,
    invoice_number: Option<String>,
    vendor_name: Option<String>,
    amount: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineSummary {
    trace_id: Uuid,
    status: DocumentStatus,
    duration_ms: u64,
    stages_completed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DecisionView {
    agent: String,
    action: String,
    outcome: String,
    confidence: f64,
    reasoning: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessResponse {
    success: bool,
    document: DocumentSummary,
    pipeline: PipelineSummary,
    decisions: Vec<DecisionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<StageError>>,
}

fn summarize_document(document: &FinancialDocument) -> DocumentSummary {
    let header = &document.extracted_data.header;
    DocumentSummary {
        id: document.id,
        invoice_number: header
            .invoice_number
            .clone()
            .or_else(|| document.metadata.get("invoiceNumber").cloned()),
        vendor_name: header
            .vendor_name
            .clone()
            .or_else(|| document.metadata.get("vendorName").cloned()),
        amount: header.total_amount.or_else(|| {
            document
                .metadata
                .get("amount")
                .and_then(|v| v.parse::<f64>().ok())
        }),
    }
}

fn decision_views(state: &AppState, decisions: &[Decision]) -> Vec<DecisionView> {
    decisions
        .iter()
        .map(|decision| DecisionView {
            agent: state
                .orchestrator
                .agent_name(decision.agent_id)
                .unwrap_or_else(|| decision.agent_id.to_string()),
            action: decision.action.clone(),
            outcome: decision.outcome.clone(),
            confidence: decision.confidence_score,
            reasoning: decision.reasoning.clone(),
            timestamp: decision.timestamp,
        })
        .collect()
}

/// Run the pipeline for a document or a minimal-field invoice shorthand.
/// Flag/reject outcomes and stage failures are normal 200s with the detail
/// in the body; only caller-contract violations 4xx.
#[instrument(skip(state, payload))]
pub async fn process_document_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProcessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let document = match payload.document {
        Some(document) => document_builder::from_payload(document),
        None => document_builder::from_shorthand(payload.shorthand)?,
    };
    let summary = summarize_document(&document);

    info!(document_id = %document.id, "Processing document through agent pipeline");
    let result = state.orchestrator.process_document(document).await?;

    let decisions = decision_views(&state, &result.decisions);
    let response = ProcessResponse {
        success: result.errors.iter().all(|e| !e.fatal),
        document: summary,
        pipeline: PipelineSummary {
            trace_id: result.trace_id,
            status: result.status,
            duration_ms: result.duration_ms,
            stages_completed: result.decisions.len(),
        },
        decisions,
        errors: if result.errors.is_empty() {
            None
        } else {
            Some(result.errors)
        },
    };
    Ok(Json(response))
}

// --- POST /api/agents ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPipelineRequest {
    document: DocumentPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunPipelineResult {
    document_id: Uuid,
    trace_id: Uuid,
    status: DocumentStatus,
    decisions_count: usize,
    decisions: Vec<Decision>,
    duration_ms: u64,
    errors: Vec<StageError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunPipelineResponse {
    success: bool,
    result: RunPipelineResult,
}

/// Run the pipeline for a fully-formed document and return the raw result.
#[instrument(skip(state, payload))]
pub async fn run_pipeline_handler(
    State(state): State<AppState>,
    Json(payload): Json<RunPipelineRequest>,
) -> Result<impl IntoResponse, AppError> {
    let document = document_builder::from_payload(payload.document);
    let result: PipelineResult = state.orchestrator.process_document(document).await?;

    let response = RunPipelineResponse {
        success: result.errors.iter().all(|e| !e.fatal),
        result: RunPipelineResult {
            document_id: result.document_id,
            trace_id: result.trace_id,
            status: result.status,
            decisions_count: result.decisions.len(),
            decisions: result.decisions,
            duration_ms: result.duration_ms,
            errors: result.errors,
        },
    };
    Ok((StatusCode::OK, Json(response)))
}

// --- GET /api/agents ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentHealthCounts {
    total_agents: usize,
    idle: usize,
    processing: usize,
    error: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentView {
    id: Uuid,
    name: String,
    capabilities: Vec<Capability>,
    status: AgentState,
    last_processed_at: Option<DateTime<Utc>>,
    processed_count: u64,
    average_latency_ms: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListAgentsResponse {
    status: String,
    timestamp: DateTime<Utc>,
    health: AgentHealthCounts,
    agents: Vec<AgentView>,
}

impl From<AgentStatus> for AgentView {
    fn from(status: AgentStatus) -> Self {
        Self {
            id: status.agent_id,
            name: status.agent_name,
            capabilities: status.capabilities,
            status: status.status,
            last_processed_at: status.last_processed_at,
            processed_count: status.processed_count,
            average_latency_ms: status.average_latency_ms,
        }
    }
}

/// Registry introspection for the admin dashboard.
pub async fn list_agents_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.orchestrator.registered_agents();
    let health = AgentHealthCounts {
        total_agents: snapshot.len(),
        idle: snapshot
            .iter()
            .filter(|a| a.status == AgentState::Idle)
            .count(),
        processing: snapshot
            .iter()
            .filter(|a| a.status == AgentState::Processing)
            .count(),
        error: snapshot
            .iter()
            .filter(|a| a.status == AgentState::Error)
            .count(),
    };
    Json(ListAgentsResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        health,
        agents: snapshot.into_iter().map(AgentView::from).collect(),
    })
}
