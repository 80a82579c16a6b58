// src/services/document_builder.rs
//
// Expands API request payloads into fully-formed `FinancialDocument`s. The
// pipeline core never sees a partial document; all defaulting happens here,
// on the collaborator side.

use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{DocumentStatus, ExtractedData, FinancialDocument, SourceType};

/// A client-supplied document. Mirrors `FinancialDocument` with everything
/// the server can default left optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub source_type: Option<SourceType>,
    #[serde(default)]
    pub raw_file_ref: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub extracted_data: Option<ExtractedData>,
}

/// The minimal-field shorthand accepted by `POST /api/agents/process`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceShorthand {
    pub invoice_number: Option<String>,
    pub vendor_name: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub source_type: Option<SourceType>,
    pub vendor_tax_id: Option<String>,
    pub tenant_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Complete a client-supplied document with server-side defaults.
pub fn from_payload(payload: DocumentPayload) -> FinancialDocument {
    let now = Utc::now();
    FinancialDocument {
        id: payload.id.unwrap_or_else(Uuid::new_v4),
        tenant_id: payload.tenant_id.unwrap_or_else(Uuid::new_v4),
        source_type: payload.source_type.unwrap_or_default(),
        raw_file_ref: payload.raw_file_ref,
        metadata: payload.metadata,
        status: payload.status.unwrap_or(DocumentStatus::Ingested),
        extracted_data: payload.extracted_data.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    }
}

/// Expand the shorthand into a fresh ingested document. The invoice fields
/// land in `metadata` where the extraction stage normalizes them into the
/// header, the same path a raw upload takes.
pub fn from_shorthand(shorthand: InvoiceShorthand) -> Result<FinancialDocument, AppError> {
    let invoice_number = shorthand
        .invoice_number
        .ok_or_else(|| AppError::BadRequest("invoiceNumber is required".to_string()))?;
    let vendor_name = shorthand
        .vendor_name
        .ok_or_else(|| AppError::BadRequest("vendorName is required".to_string()))?;
    let amount = shorthand
        .amount
        .ok_or_else(|| AppError::BadRequest("amount is required".to_string()))?;

    let mut document = FinancialDocument::new(
        shorthand.tenant_id.unwrap_or_else(Uuid::new_v4),
        shorthand.source_type.unwrap_or_default(),
    );
    document.metadata = shorthand.metadata;
    document
        .metadata
        .insert("invoiceNumber".to_string(), invoice_number);
    document
        .metadata
        .insert("vendorName".to_string(), vendor_name);
    document
        .metadata
        .insert("amount".to_string(), amount.to_string());
    if let Some(currency) = shorthand.currency {
        document.metadata.insert("currency".to_string(), currency);
    }
    if let Some(tax_id) = shorthand.vendor_tax_id {
        document.metadata.insert("vendorTaxId".to_string(), tax_id);
    }
    Ok(document)
}
