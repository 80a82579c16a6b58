// tests/pipeline_tests.rs
//
// End-to-end pipeline behavior against the orchestrator, no HTTP involved.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use ledgerly_backend::config::Config;
use ledgerly_backend::models::{Decision, DocumentStatus, FinancialDocument, SourceType};
use ledgerly_backend::services::document_builder::{self, InvoiceShorthand};
use ledgerly_backend::services::pipeline::{
    agents::{
        ApprovalAgent, ClassificationAgent, ComplianceAgent, ExtractionAgent, RiskAssessmentAgent,
    },
    create_orchestrator, AgentOutput, AgentRegistry, AgentState, Capability, DocumentAgent,
    DocumentOrchestrator, PipelineConfig, PipelineError, StageSequencer,
};

fn shorthand(invoice: &str, vendor: &str, amount: f64) -> InvoiceShorthand {
    InvoiceShorthand {
        invoice_number: Some(invoice.to_string()),
        vendor_name: Some(vendor.to_string()),
        amount: Some(amount),
        ..Default::default()
    }
}

fn simple_document(invoice: &str, vendor: &str, amount: f64) -> FinancialDocument {
    document_builder::from_shorthand(shorthand(invoice, vendor, amount)).unwrap()
}

#[tokio::test]
async fn full_run_approves_clean_invoice() {
    // Scenario: low-risk vendor, small amount, lenient tax-id policy.
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let document = simple_document("INV-1", "Acme", 499.0);

    let result = orchestrator.process_document(document).await.unwrap();

    assert_eq!(result.status, DocumentStatus::Approved);
    assert_eq!(result.decisions.len(), 6);
    assert!(result.errors.is_empty());

    let actions: Vec<&str> = result.decisions.iter().map(|d| d.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "Extraction",
            "Classification",
            "Compliance",
            "Matching",
            "Risk Assessment",
            "Approval"
        ]
    );
}

#[tokio::test]
async fn decisions_are_ordered_and_confidence_bounded() {
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let result = orchestrator
        .process_document(simple_document("INV-2", "Acme", 120.0))
        .await
        .unwrap();

    for pair in result.decisions.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    for decision in &result.decisions {
        assert!((0.0..=1.0).contains(&decision.confidence_score));
    }
}

#[tokio::test]
async fn strict_tax_policy_blocks_at_compliance() {
    // Scenario: compliance configured to block on a missing tax id. A block
    // is a decision, not an error.
    let config = Config {
        require_vendor_tax_id: true,
        ..Config::default()
    };
    let orchestrator = create_orchestrator(&config).unwrap();
    let result = orchestrator
        .process_document(simple_document("INV-3", "Acme", 499.0))
        .await
        .unwrap();

    assert_eq!(result.status, DocumentStatus::FlaggedForReview);
    assert!(result.errors.is_empty());
    assert_eq!(result.decisions.len(), 3);
    assert_eq!(result.decisions.last().unwrap().action, "Compliance");
    assert_eq!(result.decisions.last().unwrap().outcome, "block");
}

#[tokio::test]
async fn reasoning_is_idempotent_across_identical_documents() {
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let first = orchestrator
        .process_document(simple_document("INV-4", "Acme", 250.0))
        .await
        .unwrap();
    let second = orchestrator
        .process_document(simple_document("INV-4", "Acme", 250.0))
        .await
        .unwrap();

    assert_eq!(first.decisions.len(), second.decisions.len());
    for (a, b) in first.decisions.iter().zip(second.decisions.iter()) {
        assert_eq!(a.reasoning, b.reasoning);
        assert_eq!(a.outcome, b.outcome);
    }
}

#[tokio::test]
async fn risk_block_halts_before_approval() {
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let mut shorthand = shorthand("INV-5", "Shady Imports", 499.0);
    shorthand
        .metadata
        .insert("vendorRisk".to_string(), "high".to_string());
    let document = document_builder::from_shorthand(shorthand).unwrap();

    let result = orchestrator.process_document(document).await.unwrap();

    assert_eq!(result.status, DocumentStatus::FlaggedForReview);
    assert_eq!(result.decisions.last().unwrap().action, "Risk Assessment");
    assert!(!result
        .decisions
        .iter()
        .any(|d| d.action == "Approval"));
}

#[tokio::test]
async fn risk_advisory_flag_continues_to_approval() {
    let config = Config {
        high_risk_amount: 1_000.0,
        ..Config::default()
    };
    let orchestrator = create_orchestrator(&config).unwrap();
    let result = orchestrator
        .process_document(simple_document("INV-6", "Acme", 2_500.0))
        .await
        .unwrap();

    // The advisory is recorded but the document still reaches approval.
    assert_eq!(result.status, DocumentStatus::Approved);
    assert_eq!(result.errors.len(), 1);
    assert!(!result.errors[0].fatal);
    assert_eq!(result.errors[0].stage, Capability::RiskAssessment);
    assert_eq!(result.decisions.last().unwrap().action, "Approval");
    assert_eq!(result.decisions.last().unwrap().outcome, "routed_manager");
}

#[tokio::test]
async fn blocklisted_vendor_is_rejected() {
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let mut shorthand = shorthand("INV-7", "Acme", 100.0);
    shorthand
        .metadata
        .insert("vendorBlocked".to_string(), "true".to_string());
    let document = document_builder::from_shorthand(shorthand).unwrap();

    let result = orchestrator.process_document(document).await.unwrap();
    assert_eq!(result.status, DocumentStatus::Rejected);
    assert_eq!(result.decisions.last().unwrap().outcome, "reject");
}

#[derive(Debug)]
struct SlowMatchingAgent {
    id: Uuid,
}

#[async_trait]
impl DocumentAgent for SlowMatchingAgent {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        "Slow Matching Agent"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Matching]
    }

    async fn run(
        &self,
        document: &FinancialDocument,
        _trail: &[Decision],
    ) -> Result<AgentOutput, PipelineError> {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        Ok(AgentOutput {
            decision: Decision::new(self.id, "Matching", "too late", 0.5, "success"),
            document: document.clone(),
        })
    }
}

fn orchestrator_with_matching_agent(
    matching: Arc<dyn DocumentAgent>,
    config: PipelineConfig,
) -> DocumentOrchestrator {
    let registry = Arc::new(AgentRegistry::new());
    registry.register(Arc::new(ExtractionAgent::new())).unwrap();
    registry
        .register(Arc::new(ClassificationAgent::new()))
        .unwrap();
    registry
        .register(Arc::new(ComplianceAgent::new(false)))
        .unwrap();
    registry.register(matching).unwrap();
    registry
        .register(Arc::new(RiskAssessmentAgent::new(config.high_risk_amount)))
        .unwrap();
    registry
        .register(Arc::new(ApprovalAgent::new(config.auto_approve_limit)))
        .unwrap();
    DocumentOrchestrator::new(registry, StageSequencer::standard(), config)
}

#[tokio::test]
async fn matching_timeout_halts_with_one_error_and_prior_status() {
    // Scenario: the matching agent exceeds the stage budget. The run halts
    // at the last successful status with exactly one error describing it.
    let config = PipelineConfig {
        stage_timeout_ms: 50,
        ..PipelineConfig::default()
    };
    let orchestrator = orchestrator_with_matching_agent(
        Arc::new(SlowMatchingAgent { id: Uuid::new_v4() }),
        config,
    );

    let result = orchestrator
        .process_document(simple_document("INV-8", "Acme", 499.0))
        .await
        .unwrap();

    assert_eq!(result.status, DocumentStatus::ComplianceChecked);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].fatal);
    assert!(result.errors[0].message.contains("timeout"));
    assert_eq!(result.decisions.len(), 3);
}

#[derive(Debug)]
struct OverconfidentAgent {
    id: Uuid,
}

#[async_trait]
impl DocumentAgent for OverconfidentAgent {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        "Overconfident Matching Agent"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Matching]
    }

    async fn run(
        &self,
        document: &FinancialDocument,
        _trail: &[Decision],
    ) -> Result<AgentOutput, PipelineError> {
        Ok(AgentOutput {
            decision: Decision::new(self.id, "Matching", "very sure", 1.5, "success"),
            document: document.clone(),
        })
    }
}

#[tokio::test]
async fn out_of_range_confidence_is_reported_not_clamped() {
    let orchestrator = orchestrator_with_matching_agent(
        Arc::new(OverconfidentAgent { id: Uuid::new_v4() }),
        PipelineConfig::default(),
    );

    let result = orchestrator
        .process_document(simple_document("INV-9", "Acme", 499.0))
        .await
        .unwrap();

    assert_eq!(result.status, DocumentStatus::ComplianceChecked);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("confidence"));
    // The offending decision is not folded into the trail.
    assert_eq!(result.decisions.len(), 3);
}

#[tokio::test]
async fn missing_capability_is_a_structured_fatal_error() {
    // No matching agent registered at all: configuration error, fatal to
    // the run, still returned as a well-formed result.
    let registry = Arc::new(AgentRegistry::new());
    registry.register(Arc::new(ExtractionAgent::new())).unwrap();
    registry
        .register(Arc::new(ClassificationAgent::new()))
        .unwrap();
    registry
        .register(Arc::new(ComplianceAgent::new(false)))
        .unwrap();
    let orchestrator = DocumentOrchestrator::new(
        registry,
        StageSequencer::standard(),
        PipelineConfig::default(),
    );

    let result = orchestrator
        .process_document(simple_document("INV-10", "Acme", 499.0))
        .await
        .unwrap();

    assert_eq!(result.status, DocumentStatus::ComplianceChecked);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].fatal);
    assert!(result.errors[0].message.contains("No agent registered"));
}

#[tokio::test]
async fn nil_document_id_is_a_caller_contract_violation() {
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let mut document = simple_document("INV-11", "Acme", 10.0);
    document.id = Uuid::nil();

    let err = orchestrator.process_document(document).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidDocument(_)));
}

#[tokio::test]
async fn resumes_from_midway_status() {
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let mut document = FinancialDocument::new(Uuid::new_v4(), SourceType::Api);
    document.status = DocumentStatus::Matched;
    document.extracted_data.header.total_amount = Some(900.0);
    document.extracted_data.header.invoice_number = Some("INV-12".to_string());

    let result = orchestrator.process_document(document).await.unwrap();

    assert_eq!(result.status, DocumentStatus::Approved);
    let actions: Vec<&str> = result.decisions.iter().map(|d| d.action.as_str()).collect();
    assert_eq!(actions, vec!["Risk Assessment", "Approval"]);
}

#[tokio::test]
async fn terminal_status_completes_with_zero_decisions() {
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let mut document = FinancialDocument::new(Uuid::new_v4(), SourceType::Api);
    document.status = DocumentStatus::FlaggedForReview;

    let result = orchestrator.process_document(document).await.unwrap();
    assert_eq!(result.status, DocumentStatus::FlaggedForReview);
    assert!(result.decisions.is_empty());
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn fresh_registry_reports_all_idle_with_zero_counts() {
    let orchestrator = create_orchestrator(&Config::default()).unwrap();
    let agents = orchestrator.registered_agents();

    assert_eq!(agents.len(), 6);
    for agent in &agents {
        assert_eq!(agent.status, AgentState::Idle);
        assert_eq!(agent.processed_count, 0);
        assert!(agent.last_processed_at.is_none());
    }
}

#[tokio::test]
async fn concurrent_runs_account_every_stat_update() {
    let orchestrator = Arc::new(create_orchestrator(&Config::default()).unwrap());
    let runs = 16;

    let mut handles = Vec::new();
    for i in 0..runs {
        let orchestrator = Arc::clone(&orchestrator);
        handles.push(tokio::spawn(async move {
            let document = simple_document(&format!("INV-C{}", i), "Acme", 100.0);
            orchestrator.process_document(document).await.unwrap()
        }));
    }
    for handle in handles {
        let result = handle.await.unwrap();
        assert_eq!(result.status, DocumentStatus::Approved);
    }

    for agent in orchestrator.registered_agents() {
        assert_eq!(agent.processed_count, runs as u64, "agent {}", agent.agent_name);
        assert_eq!(agent.status, AgentState::Idle);
    }
}
