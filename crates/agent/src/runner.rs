use std::sync::Arc;
use std::time::Duration;

use caredesk_core::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use caredesk_core::case::CaseRecord;
use tracing::{debug, info, warn};

use crate::llm::{LlmClient, ServiceError};
use crate::stages::StageDefinition;

const ACTOR: &str = "stage-runner";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 0, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageReply {
    pub text: String,
    pub error: Option<ServiceError>,
    pub attempts: u32,
}

impl StageReply {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs one stage against the generation capability.
///
/// Failures never escape: after the retry budget is spent the reply degrades to the inline text
/// `Error: <description>`, and either way the exchange lands in the case's interaction log.
pub struct StageRunner {
    llm: Arc<dyn LlmClient>,
    call_timeout: Duration,
    retry: RetryPolicy,
    audit: Arc<dyn AuditSink>,
}

impl StageRunner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        call_timeout: Duration,
        retry: RetryPolicy,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { llm, call_timeout, retry, audit }
    }

    pub async fn run(
        &self,
        definition: &StageDefinition,
        task: &str,
        context: &str,
        case: &mut CaseRecord,
    ) -> StageReply {
        let preamble = definition.preamble(context);
        let mut attempt = 0_u32;

        let reply = loop {
            attempt += 1;
            debug!(
                event_name = "stage.call.start",
                correlation_id = %case.case_id,
                stage = definition.stage.as_str(),
                attempt,
                "invoking generation service"
            );

            match self.call(&preamble, task).await {
                Ok(text) => break StageReply { text, error: None, attempts: attempt },
                Err(error) if error.is_retryable() && attempt <= self.retry.max_retries => {
                    let backoff = self.retry.backoff(attempt - 1);
                    warn!(
                        event_name = "stage.call.retry",
                        correlation_id = %case.case_id,
                        stage = definition.stage.as_str(),
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error_kind = error.kind(),
                        error = %error,
                        "generation failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => {
                    break StageReply {
                        text: format!("Error: {error}"),
                        error: Some(error),
                        attempts: attempt,
                    }
                }
            }
        };

        case.append_log(definition.name, task, &reply.text);
        self.record(definition, case, &reply);
        reply
    }

    async fn call(&self, preamble: &str, task: &str) -> Result<String, ServiceError> {
        match tokio::time::timeout(self.call_timeout, self.llm.generate(preamble, task)).await {
            Ok(result) => result,
            Err(_) => Err(ServiceError::Timeout { after_secs: self.call_timeout.as_secs() }),
        }
    }

    fn record(&self, definition: &StageDefinition, case: &CaseRecord, reply: &StageReply) {
        let stage = definition.stage.as_str();
        let event = match &reply.error {
            None => {
                info!(
                    event_name = "stage.completed",
                    correlation_id = %case.case_id,
                    stage,
                    attempts = reply.attempts,
                    "stage completed"
                );
                AuditEvent::new(
                    case.case_id.clone(),
                    "stage.completed",
                    AuditCategory::Stage,
                    ACTOR,
                    AuditOutcome::Success,
                )
            }
            Some(error) => {
                warn!(
                    event_name = "stage.degraded",
                    correlation_id = %case.case_id,
                    stage,
                    attempts = reply.attempts,
                    error_kind = error.kind(),
                    error = %error,
                    "stage degraded to inline error text"
                );
                AuditEvent::new(
                    case.case_id.clone(),
                    "stage.degraded",
                    AuditCategory::Stage,
                    ACTOR,
                    AuditOutcome::Degraded,
                )
                .with_metadata("error_kind", error.kind())
            }
        };

        self.audit.emit(
            event
                .with_metadata("stage", stage)
                .with_metadata("attempts", reply.attempts.to_string()),
        );
    }
}
