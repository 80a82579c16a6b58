// src/services/pipeline/agents/compliance.rs

use async_trait::async_trait;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::models::{Decision, FinancialDocument};
use crate::services::pipeline::agent::DocumentAgent;
use crate::services::pipeline::errors::PipelineError;
use crate::services::pipeline::types::{AgentOutput, Capability};

const SUPPORTED_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "CAD", "AUD"];

/// Vendor tax-id and currency policy checks.
///
/// When `require_tax_id` is set, a missing vendor tax id blocks the document
/// for review; otherwise it only lowers confidence. An unsupported currency
/// always flags.
#[derive(Debug)]
pub struct ComplianceAgent {
    id: Uuid,
    require_tax_id: bool,
}

impl ComplianceAgent {
    pub fn new(require_tax_id: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            require_tax_id,
        }
    }
}

#[async_trait]
impl DocumentAgent for ComplianceAgent {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        "Compliance Agent"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Compliance]
    }

    #[instrument(skip(self, document, _trail), fields(document_id = %document.id))]
    async fn run(
        &self,
        document: &FinancialDocument,
        _trail: &[Decision],
    ) -> Result<AgentOutput, PipelineError> {
        let header = &document.extracted_data.header;

        let tax_id = header
            .vendor_tax_id
            .clone()
            .or_else(|| document.metadata.get("vendorTaxId").cloned());
        let currency = header.currency.as_deref();

        let (outcome, confidence, reasoning) = if tax_id.is_none() && self.require_tax_id {
            warn!(document_id = %document.id, "Vendor tax id missing; blocking for review");
            (
                "block",
                0.95,
                "Vendor tax id is missing; policy requires a verified tax id before payment"
                    .to_string(),
            )
        } else {
            match currency {
                Some(c) if SUPPORTED_CURRENCIES.contains(&c) => {
                    if tax_id.is_some() {
                        (
                            "success",
                            0.92,
                            format!("Vendor tax id present and currency {} is within policy", c),
                        )
                    } else {
                        (
                            "success",
                            0.75,
                            format!(
                                "Currency {} is within policy; vendor tax id unverified (not required by policy)",
                                c
                            ),
                        )
                    }
                }
                Some(c) => (
                    "flagged",
                    0.85,
                    format!("Currency {} is outside the supported settlement set", c),
                ),
                None => (
                    "flagged",
                    0.8,
                    "No currency could be established for policy evaluation".to_string(),
                ),
            }
        };

        Ok(AgentOutput {
            decision: Decision::new(
                self.id,
                Capability::Compliance.action_label(),
                reasoning,
                confidence,
                outcome,
            ),
            document: document.clone(),
        })
    }
}
