// src/models/decisions.rs
//
// Audit records emitted by pipeline agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable audit record: one agent's output for one document pass.
///
/// Decisions are append-only and ordered by creation time; once a pipeline
/// run completes they are never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub agent_id: Uuid,
    /// Human-readable stage label, e.g. "Risk Assessment".
    pub action: String,
    /// Free-text justification. Deterministic for identical input so audit
    /// trails are reproducible.
    pub reasoning: String,
    /// Clamped to [0.0, 1.0] by contract; agents producing values outside
    /// that range are reported as faulty, not silently corrected.
    pub confidence_score: f64,
    /// Stage-specific token: "success", "flagged", "block", "reject", or a
    /// GL code for the classification stage.
    pub outcome: String,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    pub fn new(
        agent_id: Uuid,
        action: impl Into<String>,
        reasoning: impl Into<String>,
        confidence_score: f64,
        outcome: impl Into<String>,
    ) -> Self {
        Self {
            agent_id,
            action: action.into(),
            reasoning: reasoning.into(),
            confidence_score,
            outcome: outcome.into(),
            timestamp: Utc::now(),
        }
    }

    /// A "flagged" or "block" outcome authorizes the sequencer to halt
    /// forward progress for human review.
    pub fn is_halting_outcome(&self) -> bool {
        self.outcome == "flagged" || self.outcome == "block"
    }
}
