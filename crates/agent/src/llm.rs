use std::time::Duration;

use async_trait::async_trait;
use caredesk_core::config::{LlmConfig, LlmProvider};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Generation capability used by every pipeline stage.
///
/// The role description carries the stage persona and accumulated context; the prompt is the
/// stage task. Implementations must not panic on provider failures.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, role_description: &str, prompt: &str) -> Result<String, ServiceError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("provider authentication failed: {0}")]
    Auth(String),
    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("provider unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },
    #[error("provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("generation timed out after {after_secs}s")]
    Timeout { after_secs: u64 },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_)
                | Self::Unavailable { .. }
                | Self::Transport(_)
                | Self::Timeout { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::RateLimited(_) => "rate_limited",
            Self::Unavailable { .. } => "unavailable",
            Self::Rejected { .. } => "rejected",
            Self::Transport(_) => "transport",
            Self::Timeout { .. } => "timeout",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// OpenAI-compatible `/chat/completions` client. Works against OpenAI and Ollama.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    request_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ServiceError> {
        let base_url = match (&config.base_url, config.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmProvider::OpenAi) => OPENAI_BASE_URL.to_string(),
            (None, LlmProvider::Ollama) => {
                return Err(ServiceError::Rejected {
                    status: 0,
                    message: "ollama provider requires llm.base_url".to_string(),
                })
            }
        };

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .use_rustls_tls()
            .build()
            .map_err(|error| ServiceError::Transport(format!("failed to build client: {error}")))?;

        Ok(Self {
            http,
            endpoint: format!("{base_url}/chat/completions"),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn generate(&self, role_description: &str, prompt: &str) -> Result<String, ServiceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: role_description },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self.http.post(&self.endpoint).timeout(self.request_timeout).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            if error.is_timeout() {
                ServiceError::Timeout { after_secs: self.request_timeout.as_secs() }
            } else {
                ServiceError::Transport(error.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(map_status(status, detail));
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|error| ServiceError::InvalidResponse(error.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::InvalidResponse("response contained no choices".to_string()))
    }
}

fn map_status(status: StatusCode, detail: String) -> ServiceError {
    let message = if detail.trim().is_empty() { status.to_string() } else { detail };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::RateLimited(message),
        status if status.is_server_error() => {
            ServiceError::Unavailable { status: status.as_u16(), message }
        }
        status => ServiceError::Rejected { status: status.as_u16(), message },
    }
}
