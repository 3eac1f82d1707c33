use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use caredesk_core::domain::approval::{ApprovalDecision, ApprovalRequest};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Where a human decision on an escalated case comes from.
///
/// A channel that loses its counterpart (closed input, dropped sender) reports `Declined`.
#[async_trait]
pub trait ApprovalChannel: Send + Sync {
    async fn request(&self, request: &ApprovalRequest) -> ApprovalDecision;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedApproval(pub ApprovalDecision);

impl FixedApproval {
    pub fn approve() -> Self {
        Self(ApprovalDecision::Approved)
    }

    pub fn decline() -> Self {
        Self(ApprovalDecision::Declined)
    }
}

#[async_trait]
impl ApprovalChannel for FixedApproval {
    async fn request(&self, _request: &ApprovalRequest) -> ApprovalDecision {
        self.0
    }
}

/// Suspension point for cases that crossed the refund threshold. Bounded by a timeout and by the
/// calling case's cancellation token; both resolve to a non-approving decision.
#[derive(Clone)]
pub struct HumanGate {
    channel: Arc<dyn ApprovalChannel>,
    timeout: Duration,
}

impl HumanGate {
    pub fn new(channel: Arc<dyn ApprovalChannel>, timeout: Duration) -> Self {
        Self { channel, timeout }
    }

    pub async fn wait(
        &self,
        request: &ApprovalRequest,
        cancel: &CancellationToken,
    ) -> ApprovalDecision {
        info!(
            event_name = "approval.requested",
            correlation_id = %request.case_id,
            timeout_secs = self.timeout.as_secs(),
            "waiting for human approval"
        );

        let decision = tokio::select! {
            biased;
            _ = cancel.cancelled() => ApprovalDecision::Cancelled,
            result = tokio::time::timeout(self.timeout, self.channel.request(request)) => {
                result.unwrap_or(ApprovalDecision::TimedOut)
            }
        };

        if decision.is_approved() {
            info!(
                event_name = "approval.resolved",
                correlation_id = %request.case_id,
                decision = decision.as_str(),
                "human approval granted"
            );
        } else {
            warn!(
                event_name = "approval.resolved",
                correlation_id = %request.case_id,
                decision = decision.as_str(),
                "human approval not granted"
            );
        }
        decision
    }
}
