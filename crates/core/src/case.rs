use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::customer::CustomerProfile;

/// Upper bound, in characters, on a stage result copied into the interaction log.
pub const LOG_RESULT_LIMIT: usize = 200;
/// Upper bound, in characters, on the task summary copied into the interaction log.
pub const LOG_TASK_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(pub Uuid);

impl CaseId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub task: String,
    pub result: String,
}

/// Mutable state of a single inquiry as it moves through the pipeline.
///
/// One record belongs to exactly one case. `actions_taken` and `interaction_log` only ever
/// grow, and `requires_human` is never cleared once raised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: CaseId,
    pub query: String,
    pub customer_id: Option<String>,
    pub intent: String,
    pub sentiment: String,
    pub priority: String,
    pub customer_info: Option<CustomerProfile>,
    pub research_findings: Vec<String>,
    pub final_message: String,
    pub proposed_solution: String,
    pub quality_feedback: String,
    pub escalation_advice: String,
    pub actions_taken: Vec<String>,
    pub requires_human: bool,
    pub escalation_reason: String,
    pub quality_score: u8,
    pub follow_up_needed: bool,
    pub interaction_log: Vec<LogEntry>,
}

impl Default for CaseRecord {
    fn default() -> Self {
        Self {
            case_id: CaseId::generate(),
            query: String::new(),
            customer_id: None,
            intent: String::new(),
            sentiment: String::new(),
            priority: String::new(),
            customer_info: None,
            research_findings: Vec::new(),
            final_message: String::new(),
            proposed_solution: String::new(),
            quality_feedback: String::new(),
            escalation_advice: String::new(),
            actions_taken: Vec::new(),
            requires_human: false,
            escalation_reason: String::new(),
            quality_score: 0,
            follow_up_needed: false,
            interaction_log: Vec::new(),
        }
    }
}

impl CaseRecord {
    pub fn new(query: impl Into<String>, customer_id: Option<String>) -> Self {
        let customer_id = customer_id.filter(|id| !id.trim().is_empty());
        Self { query: query.into(), customer_id, ..Self::default() }
    }

    pub fn append_log(&mut self, stage: &str, task: &str, result: &str) {
        self.interaction_log.push(LogEntry {
            timestamp: Utc::now(),
            stage: stage.to_string(),
            task: truncate_chars(task, LOG_TASK_LIMIT),
            result: truncate_chars(result, LOG_RESULT_LIMIT),
        });
    }

    pub fn record_action(&mut self, action: impl Into<String>) {
        self.actions_taken.push(action.into());
    }

    /// Raises the human-review flag. The first recorded reason is kept.
    pub fn flag_for_human(&mut self, reason: impl Into<String>) {
        self.requires_human = true;
        if self.escalation_reason.is_empty() {
            self.escalation_reason = reason.into();
        }
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_info.as_ref().and_then(|profile| profile.email.as_deref())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn truncate_chars(value: &str, limit: usize) -> String {
    match value.char_indices().nth(limit) {
        Some((byte_index, _)) => value[..byte_index].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{truncate_chars, CaseRecord, LOG_RESULT_LIMIT};

    #[test]
    fn reset_clears_actions_log_and_flags() {
        let mut case = CaseRecord::new("refund please", Some("12345".to_string()));
        case.intent = "REFUND".to_string();
        case.record_action("Refund processed");
        case.append_log("Greeter", "Analyze", "INTENT: REFUND");
        case.flag_for_human("Refund over $100 requires approval");
        case.quality_score = 9;
        case.follow_up_needed = true;

        case.reset();

        assert!(case.actions_taken.is_empty());
        assert!(case.interaction_log.is_empty());
        assert!(!case.requires_human);
        assert!(case.escalation_reason.is_empty());
        assert_eq!(case.quality_score, 0);
        assert!(!case.follow_up_needed);
        assert!(case.intent.is_empty());
        assert!(case.query.is_empty());
        assert!(case.customer_id.is_none());
    }

    #[test]
    fn long_results_are_truncated_to_exactly_the_limit() {
        let mut case = CaseRecord::default();
        let result = "x".repeat(450);
        case.append_log("Resolver", "What specific actions should we take?", &result);

        assert_eq!(case.interaction_log.len(), 1);
        assert_eq!(case.interaction_log[0].result.chars().count(), LOG_RESULT_LIMIT);
    }

    #[test]
    fn short_results_are_logged_verbatim() {
        let mut case = CaseRecord::default();
        case.append_log("Quality Reviewer", "Review", "APPROVED 9/10");
        assert_eq!(case.interaction_log[0].result, "APPROVED 9/10");
        assert_eq!(case.interaction_log[0].stage, "Quality Reviewer");
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let value = "é".repeat(250);
        let truncated = truncate_chars(&value, LOG_RESULT_LIMIT);
        assert_eq!(truncated.chars().count(), LOG_RESULT_LIMIT);
    }

    #[test]
    fn escalation_reason_keeps_first_cause() {
        let mut case = CaseRecord::default();
        case.flag_for_human("first");
        case.flag_for_human("second");
        assert!(case.requires_human);
        assert_eq!(case.escalation_reason, "first");
    }

    #[test]
    fn blank_customer_id_is_treated_as_absent() {
        let case = CaseRecord::new("hello", Some("   ".to_string()));
        assert!(case.customer_id.is_none());
    }
}
