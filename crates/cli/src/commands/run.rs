use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use caredesk_agent::approval::{ApprovalChannel, FixedApproval};
use caredesk_agent::llm::{ChatCompletionsClient, LlmClient};
use caredesk_agent::PipelineOrchestrator;
use caredesk_core::audit::{AuditEvent, InMemoryAuditSink};
use caredesk_core::config::{AppConfig, LoadOptions};
use caredesk_core::domain::outcome::CaseOutcome;
use caredesk_core::errors::{ApplicationError, DomainError, InterfaceError};
use serde::Serialize;

use crate::commands::{scenarios, CommandResult};
use crate::console::ConsoleApproval;

const COMMAND: &str = "run";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalMode {
    Prompt,
    Approve,
    Decline,
}

#[derive(Clone, Debug)]
pub struct RunArgs {
    pub scenario: Option<u8>,
    pub query: Option<String>,
    pub customer_id: Option<String>,
    pub approval: ApprovalMode,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    command: &'static str,
    outcome: &'a CaseOutcome,
    audit_events: Vec<AuditEvent>,
}

pub fn run(args: RunArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };
    crate::init_logging(&config);

    let client = match ChatCompletionsClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return interface_failure(
                ApplicationError::Backend(error.to_string()).into_interface("bootstrap"),
                3,
            )
        }
    };

    run_with_client(args, &config, Arc::new(client))
}

/// Runs one case against an already-built generation client; Ctrl-C abandons the case.
pub fn run_with_client(
    args: RunArgs,
    config: &AppConfig,
    llm: Arc<dyn LlmClient>,
) -> CommandResult {
    run_until_interrupted(args, config, llm, async {
        // A handler that cannot be installed never fires.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
}

/// Runs one case, giving up with exit code 130 as soon as `interrupt` completes.
pub fn run_until_interrupted<F>(
    args: RunArgs,
    config: &AppConfig,
    llm: Arc<dyn LlmClient>,
    interrupt: F,
) -> CommandResult
where
    F: Future<Output = ()>,
{
    let (query, customer_id) = match resolve_input(&args) {
        Ok(input) => input,
        Err(error) => {
            return interface_failure(ApplicationError::from(error).into_interface("cli"), 2)
        }
    };

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure(COMMAND, "runtime", format!("{error:#}"), 1),
    };

    let approvals: Arc<dyn ApprovalChannel> = match args.approval {
        ApprovalMode::Prompt => Arc::new(ConsoleApproval),
        ApprovalMode::Approve => Arc::new(FixedApproval::approve()),
        ApprovalMode::Decline => Arc::new(FixedApproval::decline()),
    };
    let audit = InMemoryAuditSink::default();
    let orchestrator =
        PipelineOrchestrator::from_config(config, llm, approvals, Arc::new(audit.clone()));

    let outcome = runtime.block_on(async {
        tokio::select! {
            outcome = orchestrator.handle_query(&query, customer_id.as_deref()) => Some(outcome),
            () = interrupt => None,
        }
    });
    // A console prompt abandoned by timeout or Ctrl-C still holds a blocking stdin read.
    runtime.shutdown_background();

    let Some(outcome) = outcome else {
        tracing::warn!(event_name = "case.interrupted", "run interrupted before the case finished");
        return CommandResult::failure(COMMAND, "cancelled", "run interrupted", 130);
    };

    if args.json {
        let report = RunReport {
            command: COMMAND,
            outcome: &outcome,
            audit_events: audit.events_for(&outcome.case_id),
        };
        return match serde_json::to_string_pretty(&report) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 1),
        };
    }

    CommandResult { exit_code: 0, output: render_text(&outcome) }
}

fn resolve_input(args: &RunArgs) -> Result<(String, Option<String>), DomainError> {
    let customer_override = args.customer_id.clone().filter(|id| !id.trim().is_empty());

    if let Some(number) = args.scenario {
        let scenario = scenarios::find(number).ok_or_else(|| {
            DomainError::InvalidInquiry(format!("unknown scenario {number} (expected 1-6)"))
        })?;
        let customer_id = customer_override.or_else(|| Some(scenario.customer_id.to_string()));
        return Ok((scenario.query.to_string(), customer_id));
    }

    match args.query.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => Ok((query.to_string(), customer_override)),
        Some(_) => Err(DomainError::InvalidInquiry("query must not be empty".to_string())),
        None => Err(DomainError::InvalidInquiry(
            "either --scenario or --query is required".to_string(),
        )),
    }
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")
}

fn interface_failure(error: InterfaceError, exit_code: u8) -> CommandResult {
    CommandResult::failure(
        COMMAND,
        error.error_class(),
        format!("{} ({error})", error.user_message()),
        exit_code,
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

pub fn render_text(outcome: &CaseOutcome) -> String {
    let mut lines = vec![
        format!("RESOLUTION SUMMARY (case {})", outcome.case_id),
        format!("Status: {}", outcome.status.as_str()),
        format!("Intent: {}", or_na(&outcome.intent)),
        format!("Sentiment: {}", or_na(&outcome.sentiment)),
        format!("Priority: {}", or_na(&outcome.priority)),
        format!("Quality Score: {}/10", outcome.quality_score),
        "Actions Taken:".to_string(),
    ];

    if outcome.actions_taken.is_empty() {
        lines.push("  (none)".to_string());
    }
    lines.extend(outcome.actions_taken.iter().map(|action| format!("  - {action}")));

    lines.push(format!("Human Escalation: {}", yes_no(outcome.requires_human)));
    if let Some(reason) = &outcome.escalation_reason {
        lines.push(format!("Escalation Reason: {reason}"));
    }
    if let Some(approval) = outcome.approval {
        lines.push(format!("Approval: {}", approval.as_str()));
    }
    lines.push(format!("Escalation Advised: {}", yes_no(outcome.escalation_advised)));
    lines.push(format!("Follow-up Needed: {}", yes_no(outcome.follow_up_needed)));

    if !outcome.final_message.is_empty() {
        lines.push(String::new());
        lines.push("Customer Message:".to_string());
        lines.push(outcome.final_message.clone());
    }

    lines.join("\n")
}
