use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::case::CaseId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Flow,
    Stage,
    Tool,
    Policy,
    Approval,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Degraded,
    Rejected,
    Escalated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub case_id: CaseId,
    pub actor: String,
}

impl AuditContext {
    pub fn new(case_id: CaseId, actor: impl Into<String>) -> Self {
        Self { case_id, actor: actor.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub case_id: CaseId,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        case_id: CaseId,
        event_type: impl Into<String>,
        category: AuditCategory,
        actor: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            case_id,
            event_type: event_type.into(),
            category,
            actor: actor.into(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn events_for(&self, case_id: &CaseId) -> Vec<AuditEvent> {
        self.events().into_iter().filter(|event| &event.case_id == case_id).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink},
        case::CaseId,
    };

    #[test]
    fn in_memory_sink_records_events_per_case() {
        let sink = InMemoryAuditSink::default();
        let case_id = CaseId::generate();
        let other_case = CaseId::generate();
        sink.emit(
            AuditEvent::new(
                case_id.clone(),
                "tool.refund_processed",
                AuditCategory::Tool,
                "tool-gateway",
                AuditOutcome::Success,
            )
            .with_metadata("order_id", "ORD-789")
            .with_metadata("amount", "85"),
        );
        sink.emit(AuditEvent::new(
            other_case,
            "stage.completed",
            AuditCategory::Stage,
            "stage-runner",
            AuditOutcome::Success,
        ));

        let events = sink.events_for(&case_id);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "tool.refund_processed");
        assert_eq!(events[0].metadata.get("order_id").map(String::as_str), Some("ORD-789"));
        assert_eq!(sink.events().len(), 2);
    }
}
