// src/services/pipeline/agents/risk.rs

use async_trait::async_trait;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::models::{Decision, FinancialDocument};
use crate::services::pipeline::agent::DocumentAgent;
use crate::services::pipeline::errors::PipelineError;
use crate::services::pipeline::types::{AgentOutput, Capability};

/// Scores the document from amount bands and the vendor risk hint carried in
/// metadata. Outcomes: "success" (low risk), "flagged" (advisory, the run
/// continues) or "block" (halt for review).
#[derive(Debug)]
pub struct RiskAssessmentAgent {
    id: Uuid,
    /// Amounts at or above this are flagged regardless of vendor standing.
    high_risk_amount: f64,
}

impl RiskAssessmentAgent {
    pub fn new(high_risk_amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            high_risk_amount,
        }
    }
}

#[async_trait]
impl DocumentAgent for RiskAssessmentAgent {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        "Risk Assessment Agent"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::RiskAssessment]
    }

    #[instrument(skip(self, document, _trail), fields(document_id = %document.id))]
    async fn run(
        &self,
        document: &FinancialDocument,
        _trail: &[Decision],
    ) -> Result<AgentOutput, PipelineError> {
        let amount = document
            .extracted_data
            .header
            .total_amount
            .unwrap_or(0.0);
        let vendor_risk = document
            .metadata
            .get("vendorRisk")
            .map(|v| v.to_lowercase());

        let (outcome, confidence, reasoning) = match vendor_risk.as_deref() {
            Some("high") => {
                warn!(document_id = %document.id, "High-risk vendor; blocking for review");
                (
                    "block",
                    0.9,
                    "Vendor is rated high risk; payment requires manual review".to_string(),
                )
            }
            Some("medium") if amount >= self.high_risk_amount / 2.0 => (
                "flagged",
                0.8,
                format!(
                    "Medium-risk vendor with elevated amount {}; advisory flag raised",
                    amount
                ),
            ),
            _ if amount >= self.high_risk_amount => (
                "flagged",
                0.85,
                format!(
                    "Amount {} meets or exceeds the high-risk threshold {}",
                    amount, self.high_risk_amount
                ),
            ),
            _ => (
                "success",
                0.93,
                format!(
                    "Amount {} is within normal bands and the vendor has no adverse rating",
                    amount
                ),
            ),
        };

        Ok(AgentOutput {
            decision: Decision::new(
                self.id,
                Capability::RiskAssessment.action_label(),
                reasoning,
                confidence,
                outcome,
            ),
            document: document.clone(),
        })
    }
}
