use std::sync::Arc;
use std::time::Duration;

use caredesk_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink,
};
use caredesk_core::case::CaseRecord;
use caredesk_core::config::AppConfig;
use caredesk_core::domain::approval::{ApprovalDecision, ApprovalRequest};
use caredesk_core::domain::outcome::{CaseOutcome, CaseStatus};
use caredesk_core::flows::{PipelineFlow, PipelineStage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::approval::{ApprovalChannel, HumanGate};
use crate::extraction::FieldExtractor;
use crate::guardrails::GuardrailPolicy;
use crate::llm::LlmClient;
use crate::refund_terms::{first_order_id, strategy_for, RefundTermsStrategy};
use crate::runner::{RetryPolicy, StageRunner};
use crate::stages::{
    ESCALATION, FOLLOWUP, GREETER, QUALITY, RESEARCHER, RESOLVER, TONE_ADAPTER,
};
use crate::tools::ToolGateway;

const ACTOR: &str = "pipeline";
const DEFAULT_FALLBACK_EMAIL: &str = "customer@email.com";

/// Per-case working state. Lives for exactly one `handle_query` call.
struct CaseRun {
    case: CaseRecord,
    context: String,
    tools: ToolGateway,
    escalation_advised: bool,
    approval: Option<ApprovalDecision>,
    cancel: CancellationToken,
}

/// Drives one inquiry through the fixed stage sequence.
///
/// The orchestrator itself holds only shared, immutable collaborators; every call builds its
/// own case record and tool gateway, so one orchestrator can serve concurrent cases.
pub struct PipelineOrchestrator {
    flow: PipelineFlow,
    runner: StageRunner,
    extractor: FieldExtractor,
    refund_terms: Arc<dyn RefundTermsStrategy>,
    gate: HumanGate,
    audit: Arc<dyn AuditSink>,
    fallback_email: String,
}

impl PipelineOrchestrator {
    pub fn new(
        runner: StageRunner,
        gate: HumanGate,
        refund_terms: Arc<dyn RefundTermsStrategy>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            flow: PipelineFlow,
            runner,
            extractor: FieldExtractor::new(),
            refund_terms,
            gate,
            audit,
            fallback_email: DEFAULT_FALLBACK_EMAIL.to_string(),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        llm: Arc<dyn LlmClient>,
        approvals: Arc<dyn ApprovalChannel>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let runner = StageRunner::new(
            llm,
            Duration::from_secs(config.llm.timeout_secs),
            RetryPolicy::with_max_retries(config.llm.max_retries),
            audit.clone(),
        );
        let gate =
            HumanGate::new(approvals, Duration::from_secs(config.pipeline.approval_timeout_secs));

        Self::new(runner, gate, strategy_for(config.pipeline.refund_terms), audit)
            .with_fallback_email(config.pipeline.fallback_email.clone())
    }

    pub fn with_fallback_email(mut self, fallback_email: impl Into<String>) -> Self {
        self.fallback_email = fallback_email.into();
        self
    }

    pub async fn handle_query(&self, query: &str, customer_id: Option<&str>) -> CaseOutcome {
        self.handle_query_cancellable(query, customer_id, CancellationToken::new()).await
    }

    /// Like `handle_query`, with a token that aborts this case's human-approval wait. The token
    /// is scoped to the one case; other cases on the same orchestrator are unaffected.
    pub async fn handle_query_cancellable(
        &self,
        query: &str,
        customer_id: Option<&str>,
        cancel: CancellationToken,
    ) -> CaseOutcome {
        let case = CaseRecord::new(query, customer_id.map(str::to_string));
        let audit = AuditContext::new(case.case_id.clone(), ACTOR);

        let mut context = format!("Customer Query: {}\n", case.query);
        if let Some(customer_id) = &case.customer_id {
            context.push_str(&format!("Customer ID: {customer_id}\n"));
        }

        info!(
            event_name = "pipeline.case.started",
            correlation_id = %case.case_id,
            has_customer_id = case.customer_id.is_some(),
            refund_terms = self.refund_terms.name(),
            "customer inquiry received"
        );

        let mut run = CaseRun {
            case,
            context,
            tools: ToolGateway::new(GuardrailPolicy::default(), self.audit.clone()),
            escalation_advised: false,
            approval: None,
            cancel,
        };

        let mut stage = self.flow.initial_stage();
        while !stage.is_terminal() {
            self.execute(stage, &mut run).await;
            stage = match self.flow.apply_with_audit(
                stage,
                run.case.requires_human,
                self.audit.as_ref(),
                &audit,
            ) {
                Ok(transition) => transition.to,
                Err(error) => {
                    warn!(
                        event_name = "pipeline.flow.rejected",
                        correlation_id = %run.case.case_id,
                        error = %error,
                        "stage transition rejected"
                    );
                    break;
                }
            };
        }

        let approved = run.approval.map(ApprovalDecision::is_approved).unwrap_or(false);
        let status = if run.case.requires_human && !approved {
            CaseStatus::Escalated
        } else {
            CaseStatus::Resolved
        };

        info!(
            event_name = "pipeline.case.completed",
            correlation_id = %run.case.case_id,
            status = status.as_str(),
            requires_human = run.case.requires_human,
            actions = run.case.actions_taken.len(),
            quality_score = run.case.quality_score,
            "customer inquiry finished"
        );

        CaseOutcome::from_case(run.case, status, run.approval, run.escalation_advised)
    }

    async fn execute(&self, stage: PipelineStage, run: &mut CaseRun) {
        match stage {
            PipelineStage::Intake => self.intake(run).await,
            PipelineStage::Research => self.research(run).await,
            PipelineStage::Tone => {
                let task = format!(
                    "Craft an empathetic response for a customer with {} sentiment.",
                    run.case.sentiment
                );
                let reply = self.runner.run(&TONE_ADAPTER, &task, &run.context, &mut run.case).await;
                run.case.final_message = reply.text.clone();
                push_context(&mut run.context, &reply.text);
            }
            PipelineStage::Resolve => self.resolve(run).await,
            PipelineStage::Quality => {
                let task = "Review this entire interaction for quality, accuracy, and completeness.";
                let reply = self.runner.run(&QUALITY, task, &run.context, &mut run.case).await;
                run.case.quality_score = self.extractor.quality_score(&reply.text);
                run.case.quality_feedback = reply.text;
            }
            PipelineStage::EscalationCheck => {
                let task = "Should this be escalated to a human?";
                let reply = self.runner.run(&ESCALATION, task, &run.context, &mut run.case).await;
                run.escalation_advised = self.extractor.escalation_advised(&reply.text);
                run.case.escalation_advice = reply.text;
            }
            PipelineStage::Followup => {
                let task = "Should we schedule a follow-up with this customer?";
                let reply = self.runner.run(&FOLLOWUP, task, &run.context, &mut run.case).await;
                run.case.follow_up_needed = self.extractor.follow_up_needed(&reply.text);
            }
            PipelineStage::HumanGate => self.await_approval(run).await,
            PipelineStage::Done => {}
        }
    }

    async fn intake(&self, run: &mut CaseRun) {
        let task = format!("Analyze this customer query: {}", run.case.query);
        let reply = self.runner.run(&GREETER, &task, &run.context, &mut run.case).await;

        let fields = self.extractor.intake(&reply.text);
        run.case.intent = fields.intent;
        run.case.sentiment = fields.sentiment;
        run.case.priority = fields.priority;
        debug!(
            event_name = "pipeline.intake.classified",
            correlation_id = %run.case.case_id,
            intent = %run.case.intent,
            sentiment = %run.case.sentiment,
            priority = %run.case.priority,
            "intake fields extracted"
        );

        push_context(&mut run.context, &reply.text);
    }

    async fn research(&self, run: &mut CaseRun) {
        if run.case.intent.contains("REFUND") {
            let policy = run.tools.search_policy("refund");
            record_finding(run, format!("Knowledge Base: {policy}"));
        }

        let tracking_intent =
            run.case.intent.contains("TRACKING") || run.case.intent.contains("SHIPPING");
        if tracking_intent {
            if let Some(order_id) = first_order_id(&run.case.query) {
                let shipment = run.tools.track_shipment(&order_id);
                record_finding(run, format!("Shipment {order_id}: {}", shipment.summary()));
            }
        }

        if let Some(customer_id) = run.case.customer_id.clone() {
            let profile = run.tools.lookup_customer(&customer_id);
            let rendered = serde_json::to_string_pretty(&profile)
                .unwrap_or_else(|_| format!("{{\"name\": \"{}\"}}", profile.name));
            push_context(&mut run.context, &format!("Customer Info: {rendered}"));
            run.case.customer_info = Some(profile);
        }

        let task = format!(
            "Based on the intent '{}', what information do we need to resolve this?",
            run.case.intent
        );
        let reply = self.runner.run(&RESEARCHER, &task, &run.context, &mut run.case).await;
        push_context(&mut run.context, &reply.text);
        run.case.research_findings.push(reply.text);
    }

    async fn resolve(&self, run: &mut CaseRun) {
        let task = "What specific actions should we take to resolve this issue?";
        let reply = self.runner.run(&RESOLVER, task, &run.context, &mut run.case).await;
        let lowered = reply.text.to_lowercase();

        if lowered.contains("refund") && run.case.query.contains("ORD-") {
            match self.refund_terms.resolve(&run.case.query, &run.case) {
                Some(terms) => {
                    let reason = run.case.intent.clone();
                    run.tools.process_refund(&mut run.case, &terms.order_id, terms.amount, &reason);
                }
                None => warn!(
                    event_name = "pipeline.refund.terms_unresolved",
                    correlation_id = %run.case.case_id,
                    strategy = self.refund_terms.name(),
                    "refund suggested but order or amount could not be resolved"
                ),
            }
        }

        if lowered.contains("email") {
            let recipient =
                run.case.customer_email().unwrap_or(self.fallback_email.as_str()).to_string();
            let subject = format!("Re: Your {} Request", run.case.intent);
            run.tools.send_notification(&mut run.case, &recipient, &subject);
        }

        push_context(&mut run.context, &reply.text);
        run.case.proposed_solution = reply.text;
    }

    async fn await_approval(&self, run: &mut CaseRun) {
        let request = ApprovalRequest {
            case_id: run.case.case_id.clone(),
            reason: run.case.escalation_reason.clone(),
            actions_taken: run.case.actions_taken.clone(),
        };
        let decision = self.gate.wait(&request, &run.cancel).await;

        let outcome =
            if decision.is_approved() { AuditOutcome::Success } else { AuditOutcome::Escalated };
        self.audit.emit(
            AuditEvent::new(
                run.case.case_id.clone(),
                "approval.decided",
                AuditCategory::Approval,
                "human-gate",
                outcome,
            )
            .with_metadata("decision", decision.as_str())
            .with_metadata("reason", request.reason),
        );
        run.approval = Some(decision);
    }
}

fn push_context(context: &mut String, text: &str) {
    context.push('\n');
    context.push_str(text);
    context.push('\n');
}

fn record_finding(run: &mut CaseRun, finding: String) {
    push_context(&mut run.context, &finding);
    run.case.research_findings.push(finding);
}
