// src/models/documents.rs
//
// Financial document model shared by the pipeline and the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Where a document entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Email,
    Api,
    Upload,
}

impl Default for SourceType {
    fn default() -> Self {
        SourceType::Api
    }
}

/// Lifecycle status of a document as it moves through the pipeline.
///
/// Forward-only, except that `FlaggedForReview` and `Rejected` park the
/// document off-pipeline until a human resets it (outside this crate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Ingested,
    Extracted,
    Classified,
    ComplianceChecked,
    Matched,
    FlaggedForReview,
    Rejected,
    Approved,
    ScheduledForPayment,
    Paid,
}

impl DocumentStatus {
    /// Terminal statuses for an automated pipeline run. A document arriving
    /// in one of these completes immediately with no further stages.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DocumentStatus::FlaggedForReview
                | DocumentStatus::Rejected
                | DocumentStatus::Approved
                | DocumentStatus::ScheduledForPayment
                | DocumentStatus::Paid
        )
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentStatus::Ingested => "ingested",
            DocumentStatus::Extracted => "extracted",
            DocumentStatus::Classified => "classified",
            DocumentStatus::ComplianceChecked => "compliance_checked",
            DocumentStatus::Matched => "matched",
            DocumentStatus::FlaggedForReview => "flagged_for_review",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::Approved => "approved",
            DocumentStatus::ScheduledForPayment => "scheduled_for_payment",
            DocumentStatus::Paid => "paid",
        };
        write!(f, "{}", s)
    }
}

/// Invoice header fields, populated incrementally by the extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceHeader {
    pub invoice_number: Option<String>,
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub vendor_name: Option<String>,
    pub vendor_tax_id: Option<String>,
    pub currency: Option<String>,
    pub total_amount: Option<f64>,
    pub tax_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Structured payload extracted from the raw document. Earlier stages may
/// leave it partially filled; later stages refine it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    #[serde(default)]
    pub header: InvoiceHeader,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// The unit of work driven through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDocument {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub raw_file_ref: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub status: DocumentStatus,
    #[serde(default)]
    pub extracted_data: ExtractedData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialDocument {
    /// Fresh document in `Ingested` state for the given tenant.
    pub fn new(tenant_id: Uuid, source_type: SourceType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            source_type,
            raw_file_ref: None,
            metadata: HashMap::new(),
            status: DocumentStatus::Ingested,
            extracted_data: ExtractedData::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at`; every mutating stage calls this.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
