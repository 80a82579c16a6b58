// src/services/pipeline/sequencer.rs
//
// Pipeline Stage Sequencer
//
// Encodes the fixed stage order and branch/halt rules as a transition table
// so the policy stays auditable and testable in isolation from agent logic.

use crate::models::{Decision, DocumentStatus};

use super::types::Capability;

/// How a stage's "flag"/"block"/"reject" outcomes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagRule {
    /// Stage has no flag outcome (extraction, classification).
    NotApplicable,
    /// Either "flagged" or "block" halts the run for human review.
    HaltOnFlagOrBlock,
    /// "block" halts; "flagged" is recorded as an advisory and the run
    /// continues.
    HaltOnBlockOnly,
    /// An explicit "reject" outcome terminates the run as rejected.
    RejectOnReject,
}

/// One row of the transition table.
#[derive(Debug, Clone)]
pub struct StageRule {
    pub from: DocumentStatus,
    pub capability: Capability,
    /// Status on success; `None` leaves the status unchanged (risk
    /// assessment passes through without advancing it).
    pub on_success: Option<DocumentStatus>,
    pub flag_rule: FlagRule,
}

/// What the sequencer decided about a completed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageDisposition {
    /// Stage succeeded; advance to `new_status` when present.
    Continue { new_status: Option<DocumentStatus> },
    /// Stage raised an advisory flag; record it and keep going.
    ContinueWithAdvisory { new_status: Option<DocumentStatus> },
    /// Halt the run with this status.
    Halt { new_status: DocumentStatus },
}

pub struct StageSequencer {
    rules: Vec<StageRule>,
}

impl StageSequencer {
    /// The standard accounts-payable stage order:
    /// extraction → classification → compliance → matching → risk → approval.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                StageRule {
                    from: DocumentStatus::Ingested,
                    capability: Capability::Extraction,
                    on_success: Some(DocumentStatus::Extracted),
                    flag_rule: FlagRule::NotApplicable,
                },
                StageRule {
                    from: DocumentStatus::Extracted,
                    capability: Capability::Classification,
                    on_success: Some(DocumentStatus::Classified),
                    flag_rule: FlagRule::NotApplicable,
                },
                StageRule {
                    from: DocumentStatus::Classified,
                    capability: Capability::Compliance,
                    on_success: Some(DocumentStatus::ComplianceChecked),
                    flag_rule: FlagRule::HaltOnFlagOrBlock,
                },
                StageRule {
                    from: DocumentStatus::ComplianceChecked,
                    capability: Capability::Matching,
                    on_success: Some(DocumentStatus::Matched),
                    flag_rule: FlagRule::HaltOnFlagOrBlock,
                },
                // Risk assessment does not advance the status; the run moves
                // on to approval once a risk decision is in the trail.
                StageRule {
                    from: DocumentStatus::Matched,
                    capability: Capability::RiskAssessment,
                    on_success: None,
                    flag_rule: FlagRule::HaltOnBlockOnly,
                },
                StageRule {
                    from: DocumentStatus::Matched,
                    capability: Capability::Approval,
                    on_success: Some(DocumentStatus::Approved),
                    flag_rule: FlagRule::RejectOnReject,
                },
            ],
        }
    }

    /// Select the next stage for a document, given its current status and
    /// the decisions produced so far this run. Returns `None` when the run
    /// is complete: terminal status, or no rule left for the current status.
    ///
    /// A rule whose capability already produced a decision in this run is
    /// skipped, which is what moves a `matched` document from risk
    /// assessment on to approval.
    pub fn next_stage(&self, status: DocumentStatus, trail: &[Decision]) -> Option<&StageRule> {
        if status.is_terminal() {
            return None;
        }
        self.rules.iter().find(|rule| {
            rule.from == status
                && !trail
                    .iter()
                    .any(|decision| decision.action == rule.capability.action_label())
        })
    }

    /// Interpret a stage's outcome token against its rule.
    pub fn disposition(&self, rule: &StageRule, outcome: &str) -> StageDisposition {
        match rule.flag_rule {
            FlagRule::NotApplicable => StageDisposition::Continue {
                new_status: rule.on_success,
            },
            FlagRule::HaltOnFlagOrBlock => {
                if outcome == "flagged" || outcome == "block" {
                    StageDisposition::Halt {
                        new_status: DocumentStatus::FlaggedForReview,
                    }
                } else {
                    StageDisposition::Continue {
                        new_status: rule.on_success,
                    }
                }
            }
            FlagRule::HaltOnBlockOnly => match outcome {
                "block" => StageDisposition::Halt {
                    new_status: DocumentStatus::FlaggedForReview,
                },
                "flagged" => StageDisposition::ContinueWithAdvisory {
                    new_status: rule.on_success,
                },
                _ => StageDisposition::Continue {
                    new_status: rule.on_success,
                },
            },
            FlagRule::RejectOnReject => {
                if outcome == "reject" {
                    StageDisposition::Halt {
                        new_status: DocumentStatus::Rejected,
                    }
                } else {
                    StageDisposition::Continue {
                        new_status: rule.on_success,
                    }
                }
            }
        }
    }
}
