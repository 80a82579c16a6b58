// src/services/pipeline/agents/classification.rs

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Decision, FinancialDocument};
use crate::services::pipeline::agent::DocumentAgent;
use crate::services::pipeline::errors::PipelineError;
use crate::services::pipeline::types::{AgentOutput, Capability};

// Keyword table scanned against line-item descriptions and the vendor name.
// First match wins; order is most-specific first.
const GL_RULES: &[(&str, &str)] = &[
    ("software", "6300-SOFTWARE"),
    ("saas", "6300-SOFTWARE"),
    ("subscription", "6300-SOFTWARE"),
    ("license", "6300-SOFTWARE"),
    ("travel", "6400-TRAVEL"),
    ("hotel", "6400-TRAVEL"),
    ("flight", "6400-TRAVEL"),
    ("consult", "6200-PROFESSIONAL-SERVICES"),
    ("legal", "6200-PROFESSIONAL-SERVICES"),
    ("audit", "6200-PROFESSIONAL-SERVICES"),
    ("freight", "5100-FREIGHT"),
    ("shipping", "5100-FREIGHT"),
    ("office", "6100-OFFICE-SUPPLIES"),
    ("supplies", "6100-OFFICE-SUPPLIES"),
];

const GL_DEFAULT: &str = "6999-GENERAL-EXPENSE";

/// Assigns a general-ledger code from line-item descriptions and the vendor
/// name. The outcome token is the GL code itself.
#[derive(Debug)]
pub struct ClassificationAgent {
    id: Uuid,
}

impl ClassificationAgent {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    fn classify(document: &FinancialDocument) -> (&'static str, Option<&'static str>) {
        let mut haystack = document
            .extracted_data
            .line_items
            .iter()
            .map(|item| item.description.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(vendor) = &document.extracted_data.header.vendor_name {
            haystack.push(' ');
            haystack.push_str(&vendor.to_lowercase());
        }

        for (keyword, code) in GL_RULES {
            if haystack.contains(keyword) {
                return (code, Some(keyword));
            }
        }
        (GL_DEFAULT, None)
    }
}

impl Default for ClassificationAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentAgent for ClassificationAgent {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        "Classification Agent"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Classification]
    }

    #[instrument(skip(self, document, _trail), fields(document_id = %document.id))]
    async fn run(
        &self,
        document: &FinancialDocument,
        _trail: &[Decision],
    ) -> Result<AgentOutput, PipelineError> {
        let (code, matched_keyword) = Self::classify(document);

        let (confidence, reasoning) = match matched_keyword {
            Some(keyword) => (
                0.9,
                format!(
                    "Matched keyword '{}' in line items/vendor name; coded to {}",
                    keyword, code
                ),
            ),
            None => (
                0.6,
                format!("No classification keyword matched; defaulted to {}", code),
            ),
        };

        let mut updated = document.clone();
        updated
            .metadata
            .insert("glCode".to_string(), code.to_string());
        updated.touch();

        Ok(AgentOutput {
            decision: Decision::new(
                self.id,
                Capability::Classification.action_label(),
                reasoning,
                confidence,
                code,
            ),
            document: updated,
        })
    }
}
