// src/services/pipeline/agents/mod.rs
//
// Built-in agent variants. Each differs only in its `run` logic and
// declared capabilities; all are deterministic heuristics so audit trails
// reproduce for identical input.

pub mod approval;
pub mod classification;
pub mod compliance;
pub mod extraction;
pub mod matching;
pub mod risk;

pub use approval::ApprovalAgent;
pub use classification::ClassificationAgent;
pub use compliance::ComplianceAgent;
pub use extraction::ExtractionAgent;
pub use matching::MatchingAgent;
pub use risk::RiskAssessmentAgent;
