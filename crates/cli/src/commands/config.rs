use std::env;
use std::fs;
use std::path::Path;

use caredesk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;

struct Field {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl Field {
    fn new(key_path: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key_path, value: value.into(), env_keys }
    }
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), 2)
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields(&config).into_iter().map(|field| {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        format!("- {} = {} (source: {source})", field.key_path, field.value)
    }));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        Field::new(
            "llm.provider",
            format!("{:?}", config.llm.provider).to_ascii_lowercase(),
            &["CAREDESK_LLM_PROVIDER"],
        ),
        Field::new("llm.model", config.llm.model.clone(), &["CAREDESK_LLM_MODEL"]),
        Field::new(
            "llm.base_url",
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["CAREDESK_LLM_BASE_URL"],
        ),
        Field::new("llm.api_key", api_key, &["CAREDESK_LLM_API_KEY", "OPENAI_API_KEY"]),
        Field::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["CAREDESK_LLM_TIMEOUT_SECS"],
        ),
        Field::new(
            "llm.max_retries",
            config.llm.max_retries.to_string(),
            &["CAREDESK_LLM_MAX_RETRIES"],
        ),
        Field::new(
            "llm.temperature",
            config.llm.temperature.to_string(),
            &["CAREDESK_LLM_TEMPERATURE"],
        ),
        Field::new(
            "llm.max_tokens",
            config.llm.max_tokens.to_string(),
            &["CAREDESK_LLM_MAX_TOKENS"],
        ),
        Field::new(
            "pipeline.approval_timeout_secs",
            config.pipeline.approval_timeout_secs.to_string(),
            &["CAREDESK_PIPELINE_APPROVAL_TIMEOUT_SECS"],
        ),
        Field::new(
            "pipeline.refund_terms",
            format!("{:?}", config.pipeline.refund_terms).to_ascii_lowercase(),
            &["CAREDESK_PIPELINE_REFUND_TERMS"],
        ),
        Field::new(
            "pipeline.fallback_email",
            config.pipeline.fallback_email.clone(),
            &["CAREDESK_PIPELINE_FALLBACK_EMAIL"],
        ),
        Field::new(
            "logging.level",
            config.logging.level.clone(),
            &["CAREDESK_LOGGING_LEVEL", "CAREDESK_LOG_LEVEL"],
        ),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["CAREDESK_LOGGING_FORMAT", "CAREDESK_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    let in_file = config_file_doc.is_some_and(|doc| {
        key_path.split('.').try_fold(doc, |current, key| current.get(key)).is_some()
    });
    if in_file {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

/// Keeps a recognizable key prefix such as `sk` and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once('-') {
        Some((prefix, _)) if prefix.len() <= 4 => format!("{prefix}-***"),
        _ => "<redacted>".to_string(),
    }
}
