use caredesk_core::domain::customer::OrderId;
use caredesk_core::policy::{DeterministicRefundPolicy, RefundPolicy, RefundPolicyInput};
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailIntent {
    Refund { order_id: OrderId, amount: Decimal },
}

impl GuardrailIntent {
    pub fn action_key(&self) -> &'static str {
        match self {
            Self::Refund { .. } => "tool.process_refund",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Escalate { reason_code: &'static str, user_message: String, fallback_path: &'static str },
}

/// Decides whether a side effect may run without a person in the loop.
///
/// Stage output never reaches this decision: the refund gate is the deterministic refund
/// policy applied to the amount the pipeline resolved.
pub struct GuardrailPolicy {
    refund_policy: Box<dyn RefundPolicy>,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { refund_policy: Box::new(DeterministicRefundPolicy) }
    }
}

impl std::fmt::Debug for GuardrailPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardrailPolicy").finish_non_exhaustive()
    }
}

impl GuardrailPolicy {
    pub fn new(refund_policy: Box<dyn RefundPolicy>) -> Self {
        Self { refund_policy }
    }

    pub fn evaluate(&self, intent: &GuardrailIntent) -> GuardrailDecision {
        match intent {
            GuardrailIntent::Refund { order_id, amount } => {
                let decision = self
                    .refund_policy
                    .evaluate(&RefundPolicyInput { order_id: order_id.clone(), amount: *amount });
                if decision.approval_required {
                    GuardrailDecision::Escalate {
                        reason_code: "refund_over_auto_limit",
                        user_message: decision.reason,
                        fallback_path: "human_approval",
                    }
                } else {
                    GuardrailDecision::Allow
                }
            }
        }
    }
}
