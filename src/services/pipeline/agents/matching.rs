// src/services/pipeline/agents/matching.rs

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Decision, FinancialDocument};
use crate::services::pipeline::agent::DocumentAgent;
use crate::services::pipeline::errors::PipelineError;
use crate::services::pipeline::types::{AgentOutput, Capability};

/// Purchase-order / invoice / receipt matching. Runs a 3-way match when a PO
/// and receipt reference are both present, a 2-way match with just the PO,
/// and passes with reduced confidence when the invoice carries no PO
/// reference at all.
#[derive(Debug)]
pub struct MatchingAgent {
    id: Uuid,
    /// Allowed invoice/PO total divergence, in percent.
    tolerance_pct: f64,
}

impl MatchingAgent {
    pub fn new(tolerance_pct: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            tolerance_pct,
        }
    }
}

#[async_trait]
impl DocumentAgent for MatchingAgent {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        "Matching Agent"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Matching]
    }

    #[instrument(skip(self, document, _trail), fields(document_id = %document.id))]
    async fn run(
        &self,
        document: &FinancialDocument,
        _trail: &[Decision],
    ) -> Result<AgentOutput, PipelineError> {
        let po_number = document.metadata.get("poNumber");
        let receipt_ref = document.metadata.get("receiptRef");
        let invoice_total = document.extracted_data.header.total_amount;

        let (outcome, confidence, reasoning) = match (po_number, invoice_total) {
            (None, _) => (
                "success",
                0.7,
                "No purchase order reference; matched 2-way against the vendor invoice only"
                    .to_string(),
            ),
            (Some(po), Some(total)) => {
                let po_amount = document
                    .metadata
                    .get("poAmount")
                    .and_then(|v| v.parse::<f64>().ok());
                match po_amount {
                    Some(expected) if expected > 0.0 => {
                        let divergence_pct = ((total - expected).abs() / expected) * 100.0;
                        if divergence_pct > self.tolerance_pct {
                            (
                                "flagged",
                                0.9,
                                format!(
                                    "Invoice total {} diverges {:.2}% from PO {} amount {} (tolerance {:.2}%)",
                                    total, divergence_pct, po, expected, self.tolerance_pct
                                ),
                            )
                        } else if receipt_ref.is_some() {
                            (
                                "success",
                                0.95,
                                format!("3-way match against PO {} and goods receipt succeeded", po),
                            )
                        } else {
                            (
                                "success",
                                0.85,
                                format!("2-way match against PO {} succeeded", po),
                            )
                        }
                    }
                    _ => (
                        "flagged",
                        0.75,
                        format!("PO {} referenced but its amount is unavailable for matching", po),
                    ),
                }
            }
            (Some(po), None) => {
                return Err(PipelineError::AgentExecution {
                    agent: self.name().to_string(),
                    message: format!(
                        "cannot match against PO {}: invoice total was never extracted",
                        po
                    ),
                });
            }
        };

        Ok(AgentOutput {
            decision: Decision::new(
                self.id,
                Capability::Matching.action_label(),
                reasoning,
                confidence,
                outcome,
            ),
            document: document.clone(),
        })
    }
}
