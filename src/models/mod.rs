pub mod decisions;
pub mod documents;

pub use decisions::Decision;
pub use documents::{
    DocumentStatus, ExtractedData, FinancialDocument, InvoiceHeader, LineItem, SourceType,
};
