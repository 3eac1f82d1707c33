use serde::{Deserialize, Serialize};

use crate::case::{CaseId, CaseRecord, LogEntry};
use crate::domain::approval::ApprovalDecision;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Resolved,
    Escalated,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolved => "RESOLVED",
            Self::Escalated => "ESCALATED",
        }
    }
}

/// Final record handed to the presentation layer. The field set is stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub case_id: CaseId,
    pub status: CaseStatus,
    pub intent: String,
    pub sentiment: String,
    pub priority: String,
    pub actions_taken: Vec<String>,
    pub quality_score: u8,
    pub requires_human: bool,
    pub follow_up_needed: bool,
    pub escalation_reason: Option<String>,
    pub approval: Option<ApprovalDecision>,
    pub escalation_advised: bool,
    pub final_message: String,
    pub interaction_log: Vec<LogEntry>,
}

impl CaseOutcome {
    pub fn from_case(
        case: CaseRecord,
        status: CaseStatus,
        approval: Option<ApprovalDecision>,
        escalation_advised: bool,
    ) -> Self {
        let escalation_reason =
            (!case.escalation_reason.is_empty()).then(|| case.escalation_reason.clone());

        Self {
            case_id: case.case_id,
            status,
            intent: case.intent,
            sentiment: case.sentiment,
            priority: case.priority,
            actions_taken: case.actions_taken,
            quality_score: case.quality_score,
            requires_human: case.requires_human,
            follow_up_needed: case.follow_up_needed,
            escalation_reason,
            approval,
            escalation_advised,
            final_message: case.final_message,
            interaction_log: case.interaction_log,
        }
    }
}
