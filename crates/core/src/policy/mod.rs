use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::OrderId;

/// Largest refund that may execute without a human decision.
pub const REFUND_APPROVAL_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicyInput {
    pub order_id: OrderId,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicyDecision {
    pub approval_required: bool,
    pub reason: String,
}

pub trait RefundPolicy: Send + Sync {
    fn evaluate(&self, input: &RefundPolicyInput) -> RefundPolicyDecision;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicRefundPolicy;

impl RefundPolicy for DeterministicRefundPolicy {
    fn evaluate(&self, input: &RefundPolicyInput) -> RefundPolicyDecision {
        evaluate_refund(input)
    }
}

pub fn evaluate_refund(input: &RefundPolicyInput) -> RefundPolicyDecision {
    if input.amount > REFUND_APPROVAL_THRESHOLD {
        return RefundPolicyDecision {
            approval_required: true,
            reason: format!(
                "Refund over ${REFUND_APPROVAL_THRESHOLD} requires approval: ${} for {}",
                input.amount.normalize(),
                input.order_id
            ),
        };
    }

    RefundPolicyDecision {
        approval_required: false,
        reason: format!("Refund within ${REFUND_APPROVAL_THRESHOLD} automatic limit"),
    }
}
