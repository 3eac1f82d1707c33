use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use caredesk_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use caredesk_core::case::CaseRecord;
use caredesk_core::domain::customer::{CustomerProfile, OrderId};
use caredesk_core::domain::shipment::ShipmentStatus;
use caredesk_core::knowledge;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::guardrails::{GuardrailDecision, GuardrailIntent, GuardrailPolicy};

const ACTOR: &str = "tool-gateway";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefundOutcome {
    Processed { reference: String, message: String },
    Escalated { reason: String, message: String },
}

impl RefundOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Processed { message, .. } | Self::Escalated { message, .. } => message,
        }
    }
}

/// Side-effecting actions available to the pipeline.
///
/// One gateway serves one case. Reference-id sequences are atomics, so the gateway can be
/// shared between tasks without a lock.
pub struct ToolGateway {
    guardrails: GuardrailPolicy,
    audit: Arc<dyn AuditSink>,
    refund_sequence: AtomicU64,
    notification_sequence: AtomicU64,
}

impl ToolGateway {
    pub fn new(guardrails: GuardrailPolicy, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            guardrails,
            audit,
            refund_sequence: AtomicU64::new(0),
            notification_sequence: AtomicU64::new(0),
        }
    }

    pub fn search_policy(&self, topic: &str) -> String {
        knowledge::search_policies(topic)
    }

    pub fn lookup_customer(&self, customer_id: &str) -> CustomerProfile {
        knowledge::find_customer(customer_id)
    }

    pub fn track_shipment(&self, order_id: &OrderId) -> ShipmentStatus {
        knowledge::find_shipment(order_id)
    }

    pub fn process_refund(
        &self,
        case: &mut CaseRecord,
        order_id: &OrderId,
        amount: Decimal,
        reason: &str,
    ) -> RefundOutcome {
        let amount = amount.normalize();
        let intent = GuardrailIntent::Refund { order_id: order_id.clone(), amount };

        match self.guardrails.evaluate(&intent) {
            GuardrailDecision::Allow => {
                let reference = synthetic_id("REF", &self.refund_sequence);
                let message = format!(
                    "Refund processed: ${amount} for {order_id}. Reference: {reference}. ETA: 5-7 days."
                );
                case.record_action(message.clone());
                info!(
                    event_name = "tool.refund.processed",
                    correlation_id = %case.case_id,
                    order_id = %order_id,
                    amount = %amount,
                    reference = %reference,
                    "refund processed"
                );
                self.audit.emit(
                    AuditEvent::new(
                        case.case_id.clone(),
                        "tool.refund_processed",
                        AuditCategory::Tool,
                        ACTOR,
                        AuditOutcome::Success,
                    )
                    .with_metadata("action", intent.action_key())
                    .with_metadata("order_id", order_id.to_string())
                    .with_metadata("amount", amount.to_string())
                    .with_metadata("reference", reference.clone()),
                );
                RefundOutcome::Processed { reference, message }
            }
            GuardrailDecision::Escalate { reason_code, user_message, .. } => {
                case.flag_for_human(user_message.clone());
                warn!(
                    event_name = "tool.refund.escalated",
                    correlation_id = %case.case_id,
                    order_id = %order_id,
                    amount = %amount,
                    reason_code,
                    "refund held for human approval"
                );
                self.audit.emit(
                    AuditEvent::new(
                        case.case_id.clone(),
                        "policy.refund_escalated",
                        AuditCategory::Policy,
                        ACTOR,
                        AuditOutcome::Escalated,
                    )
                    .with_metadata("action", intent.action_key())
                    .with_metadata("reason_code", reason_code)
                    .with_metadata("order_id", order_id.to_string())
                    .with_metadata("amount", amount.to_string()),
                );
                RefundOutcome::Escalated {
                    message: format!(
                        "ESCALATED: ${amount} refund requires human approval. Reason: {reason}"
                    ),
                    reason: user_message,
                }
            }
        }
    }

    pub fn send_notification(&self, case: &mut CaseRecord, recipient: &str, subject: &str) -> String {
        let notification_id = synthetic_id("EMAIL", &self.notification_sequence);
        let message = format!("Email sent to {recipient}. Subject: {subject}. ID: {notification_id}");
        case.record_action(message.clone());
        info!(
            event_name = "tool.notification.sent",
            correlation_id = %case.case_id,
            notification_id = %notification_id,
            "notification sent"
        );
        self.audit.emit(
            AuditEvent::new(
                case.case_id.clone(),
                "tool.notification_sent",
                AuditCategory::Tool,
                ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("recipient", recipient)
            .with_metadata("notification_id", notification_id),
        );
        message
    }
}

fn synthetic_id(prefix: &str, sequence: &AtomicU64) -> String {
    let next = sequence.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{prefix}-{}-{next}", Utc::now().format("%Y%m%d%H%M%S"))
}
