// src/services/pipeline/agents/approval.rs

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Decision, FinancialDocument};
use crate::services::pipeline::agent::DocumentAgent;
use crate::services::pipeline::errors::PipelineError;
use crate::services::pipeline::types::{AgentOutput, Capability};

/// Routes the final approval. Amounts at or under the auto-approve limit go
/// touchless; larger ones approve with the routing tier named in the
/// outcome. A blocklisted vendor produces an explicit "reject".
#[derive(Debug)]
pub struct ApprovalAgent {
    id: Uuid,
    auto_approve_limit: f64,
}

impl ApprovalAgent {
    pub fn new(auto_approve_limit: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            auto_approve_limit,
        }
    }
}

#[async_trait]
impl DocumentAgent for ApprovalAgent {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        "Approval Agent"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Approval]
    }

    #[instrument(skip(self, document, trail), fields(document_id = %document.id))]
    async fn run(
        &self,
        document: &FinancialDocument,
        trail: &[Decision],
    ) -> Result<AgentOutput, PipelineError> {
        let amount = document
            .extracted_data
            .header
            .total_amount
            .unwrap_or(0.0);
        let vendor_blocked = document
            .metadata
            .get("vendorBlocked")
            .map(|v| v == "true")
            .unwrap_or(false);
        let risk_flagged = trail
            .iter()
            .any(|d| d.action == Capability::RiskAssessment.action_label() && d.outcome == "flagged");

        let (outcome, confidence, reasoning) = if vendor_blocked {
            (
                "reject",
                0.97,
                "Vendor is on the payment blocklist; invoice rejected".to_string(),
            )
        } else if amount <= self.auto_approve_limit && !risk_flagged {
            (
                "success",
                0.95,
                format!(
                    "Amount {} is at or under the auto-approve limit {} with a clean trail; approved touchless",
                    amount, self.auto_approve_limit
                ),
            )
        } else {
            // Above the limit (or risk-flagged) still approves, but the
            // routing tier is recorded for downstream workflow.
            let tier = if amount > self.auto_approve_limit * 10.0 {
                "routed_director"
            } else {
                "routed_manager"
            };
            (
                tier,
                0.88,
                format!(
                    "Amount {} exceeds the touchless limit or carries a risk flag; approved via {} tier",
                    amount, tier
                ),
            )
        };

        Ok(AgentOutput {
            decision: Decision::new(
                self.id,
                Capability::Approval.action_label(),
                reasoning,
                confidence,
                outcome,
            ),
            document: document.clone(),
        })
    }
}
