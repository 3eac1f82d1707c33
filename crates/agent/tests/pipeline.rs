use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use caredesk_agent::approval::{ApprovalChannel, FixedApproval, HumanGate};
use caredesk_agent::llm::{LlmClient, ServiceError};
use caredesk_agent::refund_terms::{LiteralRefundTerms, ParsedRefundTerms, RefundTermsStrategy};
use caredesk_agent::runner::{RetryPolicy, StageRunner};
use caredesk_agent::PipelineOrchestrator;
use caredesk_core::audit::InMemoryAuditSink;
use caredesk_core::domain::approval::{ApprovalDecision, ApprovalRequest};
use caredesk_core::domain::outcome::CaseStatus;
use tokio_util::sync::CancellationToken;

const STANDARD_REFUND: &str = "Hi, I received my order yesterday but the product is completely \
     defective. The screen has lines through it. I'd like a full refund for order ORD-789.";
const HIGH_VALUE_REFUND: &str = "I purchased a gaming laptop last week (order ORD-321) for \
     $1,500 but it keeps crashing. I want a full refund ASAP!";

struct Script {
    greeter: &'static str,
    resolver: &'static str,
    quality: &'static str,
    escalation: &'static str,
    followup: &'static str,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            greeter: "GREETING: Hello!\nINTENT: REFUND\nSENTIMENT: NEGATIVE\nPRIORITY: HIGH\n\
                      SUMMARY: Customer wants a refund.",
            resolver: "1. Process a full refund for the order\n2. Send a confirmation email",
            quality: "APPROVED. Score: 9/10",
            escalation: "NO_ESCALATION - standard request",
            followup: "FOLLOW_UP in 3 days to confirm satisfaction",
        }
    }
}

/// Answers each stage from a fixed script, keyed by the stage task.
struct ScriptedLlm {
    script: Script,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedLlm {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self { script, calls: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> Vec<(String, String)> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, role_description: &str, prompt: &str) -> Result<String, ServiceError> {
        match self.calls.lock() {
            Ok(mut calls) => calls.push((role_description.to_string(), prompt.to_string())),
            Err(poisoned) => {
                poisoned.into_inner().push((role_description.to_string(), prompt.to_string()))
            }
        }

        let reply = if prompt.starts_with("Analyze this customer query") {
            self.script.greeter
        } else if prompt.starts_with("Based on the intent") {
            "We need the order details and the refund policy."
        } else if prompt.starts_with("Craft an empathetic response") {
            "Dear customer, we are sorry for the trouble and will make this right."
        } else if prompt.starts_with("What specific actions") {
            self.script.resolver
        } else if prompt.starts_with("Review this entire interaction") {
            self.script.quality
        } else if prompt.starts_with("Should this be escalated") {
            self.script.escalation
        } else if prompt.starts_with("Should we schedule a follow-up") {
            self.script.followup
        } else {
            "unexpected task"
        };
        Ok(reply.to_string())
    }
}

struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    async fn generate(&self, _role: &str, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable { status: 503, message: "upstream down".to_string() })
    }
}

struct NeverAnswers;

#[async_trait]
impl ApprovalChannel for NeverAnswers {
    async fn request(&self, _request: &ApprovalRequest) -> ApprovalDecision {
        std::future::pending::<ApprovalDecision>().await
    }
}

fn orchestrator(
    llm: Arc<dyn LlmClient>,
    approvals: Arc<dyn ApprovalChannel>,
    refund_terms: Arc<dyn RefundTermsStrategy>,
    approval_timeout: Duration,
) -> (PipelineOrchestrator, InMemoryAuditSink) {
    let sink = InMemoryAuditSink::default();
    let runner = StageRunner::new(
        llm,
        Duration::from_secs(2),
        RetryPolicy { max_retries: 0, base_delay_ms: 1, max_delay_ms: 1 },
        Arc::new(sink.clone()),
    );
    let gate = HumanGate::new(approvals, approval_timeout);
    (PipelineOrchestrator::new(runner, gate, refund_terms, Arc::new(sink.clone())), sink)
}

fn parsed_with(
    llm: Arc<dyn LlmClient>,
    approvals: Arc<dyn ApprovalChannel>,
) -> (PipelineOrchestrator, InMemoryAuditSink) {
    orchestrator(llm, approvals, Arc::new(ParsedRefundTerms), Duration::from_secs(1))
}

#[tokio::test]
async fn small_refund_resolves_without_human() {
    let llm = ScriptedLlm::new(Script::default());
    let (pipeline, _) = parsed_with(llm.clone(), Arc::new(FixedApproval::decline()));

    let outcome = pipeline.handle_query(STANDARD_REFUND, Some("12345")).await;

    assert_eq!(outcome.status, CaseStatus::Resolved);
    assert!(!outcome.requires_human);
    assert_eq!(outcome.approval, None);
    assert_eq!(outcome.intent, "REFUND");
    assert_eq!(outcome.sentiment, "NEGATIVE");
    assert_eq!(outcome.priority, "HIGH");
    assert_eq!(outcome.quality_score, 9);
    assert!(outcome.follow_up_needed);
    assert!(!outcome.escalation_advised);
    assert_eq!(outcome.actions_taken.len(), 2);
    assert!(outcome.actions_taken[0].starts_with("Refund processed: $85 for ORD-789."));
    assert!(outcome.actions_taken[1].starts_with("Email sent to jane@email.com."));
    assert_eq!(outcome.interaction_log.len(), 7);
    assert_eq!(llm.calls().len(), 7);
}

#[tokio::test]
async fn high_value_refund_declined_is_escalated_without_refund_action() {
    let llm = ScriptedLlm::new(Script {
        resolver: "Process a full refund of the laptop purchase.",
        ..Script::default()
    });
    let (pipeline, sink) = parsed_with(llm, Arc::new(FixedApproval::decline()));

    let outcome = pipeline.handle_query(HIGH_VALUE_REFUND, Some("67890")).await;

    assert_eq!(outcome.status, CaseStatus::Escalated);
    assert!(outcome.requires_human);
    assert_eq!(outcome.approval, Some(ApprovalDecision::Declined));
    assert_eq!(
        outcome.escalation_reason.as_deref(),
        Some("Refund over $100 requires approval: $1500 for ORD-321")
    );
    assert!(outcome.actions_taken.iter().all(|action| !action.starts_with("Refund processed")));

    let decided = sink
        .events_for(&outcome.case_id)
        .into_iter()
        .filter(|event| event.event_type == "approval.decided")
        .count();
    assert_eq!(decided, 1);
}

#[tokio::test]
async fn high_value_refund_approved_resolves() {
    let llm = ScriptedLlm::new(Script {
        resolver: "Process a full refund of the laptop purchase.",
        ..Script::default()
    });
    let (pipeline, _) = parsed_with(llm, Arc::new(FixedApproval::approve()));

    let outcome = pipeline.handle_query(HIGH_VALUE_REFUND, Some("67890")).await;

    assert_eq!(outcome.status, CaseStatus::Resolved);
    assert!(outcome.requires_human);
    assert_eq!(outcome.approval, Some(ApprovalDecision::Approved));
}

#[tokio::test]
async fn literal_terms_use_fixed_order_id() {
    let llm = ScriptedLlm::new(Script::default());
    let (pipeline, _) = orchestrator(
        llm,
        Arc::new(FixedApproval::decline()),
        Arc::new(LiteralRefundTerms),
        Duration::from_secs(1),
    );

    let outcome = pipeline.handle_query(HIGH_VALUE_REFUND, Some("67890")).await;

    assert_eq!(outcome.status, CaseStatus::Escalated);
    assert_eq!(
        outcome.escalation_reason.as_deref(),
        Some("Refund over $100 requires approval: $1500 for ORD-789")
    );
    assert_eq!(outcome.actions_taken.len(), 1);
    assert!(outcome.actions_taken[0].starts_with("Email sent to john@email.com."));
}

#[tokio::test]
async fn refund_needs_order_token_in_query() {
    let llm = ScriptedLlm::new(Script::default());
    let (pipeline, _) = parsed_with(llm, Arc::new(FixedApproval::decline()));

    let outcome = pipeline
        .handle_query("I paid $1,500 for a laptop and want a refund", None)
        .await;

    assert_eq!(outcome.status, CaseStatus::Resolved);
    assert!(!outcome.requires_human);
    assert_eq!(outcome.actions_taken.len(), 1);
    assert!(outcome.actions_taken[0].starts_with("Email sent to customer@email.com."));
}

#[tokio::test]
async fn failing_generation_still_produces_outcome() {
    let (pipeline, sink) = parsed_with(Arc::new(FailingLlm), Arc::new(FixedApproval::decline()));

    let outcome = pipeline.handle_query(STANDARD_REFUND, Some("12345")).await;

    assert_eq!(outcome.status, CaseStatus::Resolved);
    assert_eq!(outcome.intent, "");
    assert_eq!(outcome.quality_score, 8);
    assert!(!outcome.follow_up_needed);
    assert!(outcome.actions_taken.is_empty());
    assert_eq!(outcome.interaction_log.len(), 7);
    assert!(outcome
        .interaction_log
        .iter()
        .all(|entry| entry.result.starts_with("Error: provider unavailable (503)")));
    assert_eq!(
        sink.events().iter().filter(|event| event.event_type == "stage.degraded").count(),
        7
    );
}

#[tokio::test]
async fn approval_timeout_escalates() {
    let llm = ScriptedLlm::new(Script::default());
    let (pipeline, _) = orchestrator(
        llm,
        Arc::new(NeverAnswers),
        Arc::new(ParsedRefundTerms),
        Duration::from_millis(20),
    );

    let outcome = pipeline.handle_query(HIGH_VALUE_REFUND, Some("67890")).await;

    assert_eq!(outcome.status, CaseStatus::Escalated);
    assert_eq!(outcome.approval, Some(ApprovalDecision::TimedOut));
}

#[tokio::test]
async fn cancelled_approval_escalates() {
    let llm = ScriptedLlm::new(Script::default());
    let (pipeline, _) = orchestrator(
        llm,
        Arc::new(NeverAnswers),
        Arc::new(ParsedRefundTerms),
        Duration::from_secs(30),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome =
        pipeline.handle_query_cancellable(HIGH_VALUE_REFUND, Some("67890"), cancel).await;

    assert_eq!(outcome.status, CaseStatus::Escalated);
    assert_eq!(outcome.approval, Some(ApprovalDecision::Cancelled));
}

#[tokio::test]
async fn cancelling_one_case_does_not_affect_later_cases() {
    let llm = ScriptedLlm::new(Script::default());
    let (pipeline, _) = parsed_with(llm, Arc::new(FixedApproval::approve()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let cancelled =
        pipeline.handle_query_cancellable(HIGH_VALUE_REFUND, Some("67890"), cancel).await;
    assert_eq!(cancelled.approval, Some(ApprovalDecision::Cancelled));

    let later = pipeline.handle_query(HIGH_VALUE_REFUND, Some("67890")).await;
    assert_eq!(later.approval, Some(ApprovalDecision::Approved));
    assert_eq!(later.status, CaseStatus::Resolved);
}

#[tokio::test]
async fn unrepresentable_refund_amount_takes_no_refund_action() {
    let llm = ScriptedLlm::new(Script::default());
    let (pipeline, _) = parsed_with(llm, Arc::new(FixedApproval::approve()));

    let outcome = pipeline
        .handle_query(
            "Please refund order ORD-789 for $79228162514264337593543950335k right now.",
            Some("12345"),
        )
        .await;

    assert_eq!(outcome.approval, None);
    assert!(!outcome.requires_human);
    assert!(outcome.actions_taken.iter().all(|action| !action.starts_with("Refund processed")));
}

#[tokio::test]
async fn research_context_carries_customer_and_shipment() {
    let llm = ScriptedLlm::new(Script {
        greeter: "INTENT: TRACKING\nSENTIMENT: NEUTRAL\nPRIORITY: MEDIUM",
        resolver: "Share the tracking status with the customer.",
        ..Script::default()
    });
    let (pipeline, _) = parsed_with(llm.clone(), Arc::new(FixedApproval::decline()));

    let outcome = pipeline
        .handle_query(
            "Where is my package? Order ORD-555 was supposed to be here by now.",
            Some("11111"),
        )
        .await;

    assert_eq!(outcome.status, CaseStatus::Resolved);
    assert!(outcome.actions_taken.is_empty());

    let calls = llm.calls();
    let (research_role, research_task) = &calls[1];
    assert_eq!(
        research_task,
        "Based on the intent 'TRACKING', what information do we need to resolve this?"
    );
    assert!(research_role.contains("Customer Query: Where is my package?"));
    assert!(research_role.contains("Customer ID: 11111"));
    assert!(research_role.contains("Customer Info: {"));
    assert!(research_role.contains("Sarah Johnson"));
    assert!(research_role.contains("Shipment ORD-555: In Transit (at Chicago, IL, ETA 2024-02-18)"));

    let (tone_role, tone_task) = &calls[2];
    assert_eq!(tone_task, "Craft an empathetic response for a customer with NEUTRAL sentiment.");
    assert!(tone_role.contains("We need the order details and the refund policy."));
}

#[tokio::test]
async fn concurrent_cases_do_not_share_state() {
    let llm = ScriptedLlm::new(Script::default());
    let (pipeline, _) = parsed_with(llm, Arc::new(FixedApproval::decline()));

    let (small, large) = tokio::join!(
        pipeline.handle_query(STANDARD_REFUND, Some("12345")),
        pipeline.handle_query(HIGH_VALUE_REFUND, Some("67890")),
    );

    assert_ne!(small.case_id, large.case_id);
    assert_eq!(small.status, CaseStatus::Resolved);
    assert!(!small.requires_human);
    assert_eq!(large.status, CaseStatus::Escalated);
    assert_eq!(small.interaction_log.len(), 7);
    assert_eq!(large.interaction_log.len(), 7);
}
