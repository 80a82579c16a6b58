pub mod document_builder;
pub mod pipeline;
