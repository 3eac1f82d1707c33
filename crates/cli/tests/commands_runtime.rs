use std::env;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use caredesk_agent::llm::{LlmClient, ServiceError};
use caredesk_cli::commands::run::{run_until_interrupted, run_with_client, ApprovalMode, RunArgs};
use caredesk_cli::commands::{config, run, scenarios};
use caredesk_core::config::AppConfig;
use serde_json::Value;

/// Replies to each stage task with a fixed refund-flavored answer.
struct ScriptedLlm;

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, _role_description: &str, prompt: &str) -> Result<String, ServiceError> {
        let reply = if prompt.starts_with("Analyze this customer query") {
            "GREETING: Hi!\n{\"intent\": \"REFUND\", \"sentiment\": \"URGENT\", \"priority\": \"HIGH\"}"
        } else if prompt.starts_with("What specific actions") {
            "Issue a full refund and send an email confirmation."
        } else if prompt.starts_with("Review this entire interaction") {
            "NEEDS_REVISION\n{\"score\": 7}"
        } else if prompt.starts_with("Should this be escalated") {
            "{\"escalate\": true}"
        } else if prompt.starts_with("Should we schedule a follow-up") {
            "{\"follow_up\": false}"
        } else {
            "Noted."
        };
        Ok(reply.to_string())
    }
}

/// Never finishes a generation call.
struct StalledLlm;

#[async_trait]
impl LlmClient for StalledLlm {
    async fn generate(&self, _role_description: &str, _prompt: &str) -> Result<String, ServiceError> {
        std::future::pending().await
    }
}

fn run_args(scenario: Option<u8>, query: Option<&str>, approval: ApprovalMode) -> RunArgs {
    RunArgs {
        scenario,
        query: query.map(str::to_string),
        customer_id: None,
        approval,
        json: true,
    }
}

#[test]
fn run_returns_config_failure_without_api_key() {
    with_env(&[], || {
        let result = run::run(run_args(Some(1), None, ApprovalMode::Decline));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "run");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().is_some_and(|message| message.contains("OPENAI_API_KEY")));
    });
}

#[test]
fn run_with_declined_approval_reports_escalation() {
    let result = run_with_client(
        run_args(Some(2), None, ApprovalMode::Decline),
        &AppConfig::default(),
        Arc::new(ScriptedLlm),
    );
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    let outcome = &payload["outcome"];
    assert_eq!(outcome["status"], "ESCALATED");
    assert_eq!(outcome["intent"], "REFUND");
    assert_eq!(outcome["requires_human"], true);
    assert_eq!(outcome["approval"], "declined");
    assert_eq!(outcome["quality_score"], 7);
    assert_eq!(outcome["escalation_advised"], true);
    assert_eq!(outcome["follow_up_needed"], false);
    assert!(outcome["escalation_reason"]
        .as_str()
        .is_some_and(|reason| reason.contains("ORD-321")));

    let audit_types: Vec<&str> = payload["audit_events"]
        .as_array()
        .map(|events| events.iter().filter_map(|event| event["event_type"].as_str()).collect())
        .unwrap_or_default();
    assert!(audit_types.contains(&"policy.refund_escalated"));
    assert!(audit_types.contains(&"approval.decided"));
}

#[test]
fn run_with_small_refund_resolves_without_gate() {
    let result = run_with_client(
        run_args(Some(1), None, ApprovalMode::Prompt),
        &AppConfig::default(),
        Arc::new(ScriptedLlm),
    );
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    let outcome = &payload["outcome"];
    assert_eq!(outcome["status"], "RESOLVED");
    assert_eq!(outcome["requires_human"], false);
    assert_eq!(outcome["approval"], Value::Null);

    let actions: Vec<&str> = outcome["actions_taken"]
        .as_array()
        .map(|actions| actions.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    assert_eq!(actions.len(), 2);
    assert!(actions[0].starts_with("Refund processed: $85 for ORD-789"));
    assert!(actions[1].starts_with("Email sent to jane@email.com"));
}

#[test]
fn run_text_output_lists_summary_fields() {
    let mut args = run_args(None, Some("Where is my package? Order ORD-555"), ApprovalMode::Decline);
    args.json = false;
    let result = run_with_client(args, &AppConfig::default(), Arc::new(ScriptedLlm));

    assert_eq!(result.exit_code, 0);
    assert!(result.output.contains("Status: RESOLVED"));
    assert!(result.output.contains("Quality Score: 7/10"));
    assert!(result.output.contains("Escalation Advised: Yes"));
}

#[test]
fn run_rejects_blank_query_as_bad_request() {
    let result = run_with_client(
        run_args(None, Some("   "), ApprovalMode::Decline),
        &AppConfig::default(),
        Arc::new(ScriptedLlm),
    );
    assert_eq!(result.exit_code, 2);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "bad_request");
}

#[test]
fn interrupt_abandons_a_stalled_stage() {
    let result = run_until_interrupted(
        run_args(Some(1), None, ApprovalMode::Decline),
        &AppConfig::default(),
        Arc::new(StalledLlm),
        std::future::ready(()),
    );
    assert_eq!(result.exit_code, 130);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "run");
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "cancelled");
}

#[test]
fn scenarios_lists_all_six() {
    let result = scenarios::run();
    assert_eq!(result.exit_code, 0);
    for number in 1..=6 {
        assert!(result.output.contains(&format!("{number}. ")), "missing scenario {number}");
    }
}

#[test]
fn config_redacts_api_key_and_attributes_sources() {
    with_env(
        &[("CAREDESK_LLM_API_KEY", "sk-very-secret"), ("CAREDESK_LLM_MODEL", "gpt-4o-mini")],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);
            assert!(!result.output.contains("very-secret"));
            assert!(result
                .output
                .contains("- llm.api_key = sk-*** (source: env (CAREDESK_LLM_API_KEY))"));
            assert!(result
                .output
                .contains("- llm.model = gpt-4o-mini (source: env (CAREDESK_LLM_MODEL))"));
            assert!(result
                .output
                .contains("- pipeline.approval_timeout_secs = 300 (source: default)"));
        },
    );
}

#[test]
fn config_accepts_openai_key_fallback() {
    with_env(&[("OPENAI_API_KEY", "sk-fallback")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("- llm.api_key = sk-*** (source: env (OPENAI_API_KEY))"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let keys = [
        "CAREDESK_LLM_PROVIDER",
        "CAREDESK_LLM_API_KEY",
        "CAREDESK_LLM_BASE_URL",
        "CAREDESK_LLM_MODEL",
        "CAREDESK_LLM_TIMEOUT_SECS",
        "CAREDESK_LLM_MAX_RETRIES",
        "CAREDESK_LLM_TEMPERATURE",
        "CAREDESK_LLM_MAX_TOKENS",
        "CAREDESK_PIPELINE_APPROVAL_TIMEOUT_SECS",
        "CAREDESK_PIPELINE_REFUND_TERMS",
        "CAREDESK_PIPELINE_FALLBACK_EMAIL",
        "CAREDESK_LOGGING_LEVEL",
        "CAREDESK_LOGGING_FORMAT",
        "CAREDESK_LOG_LEVEL",
        "CAREDESK_LOG_FORMAT",
        "OPENAI_API_KEY",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_fn));

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}
