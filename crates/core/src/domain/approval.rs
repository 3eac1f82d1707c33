use serde::{Deserialize, Serialize};

use crate::case::CaseId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub case_id: CaseId,
    pub reason: String,
    pub actions_taken: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Declined,
    TimedOut,
    Cancelled,
}

impl ApprovalDecision {
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Interprets a free-form reply from a human approver. Only `yes`/`y` approve.
    pub fn from_reply(reply: &str) -> Self {
        match reply.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Self::Approved,
            _ => Self::Declined,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Declined => "declined",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}
