//! OpenAI-compatible chat-completions client.
//!
//! Sends the decision request under a strict JSON schema and returns the
//! reply as an unvalidated [`RawDecision`]. Works against any endpoint that
//! implements `POST {api_url}/chat/completions` with `response_format`.

use crate::prompt::{response_schema, system_message, user_message, SCHEMA_NAME};
use anyhow::Context;
use async_trait::async_trait;
use llm_trade_core::{DecisionOracle, DecisionRequest, OracleConfig, OracleError, RawDecision};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Environment variable holding the oracle API key.
pub const API_KEY_ENV: &str = "ORACLE_API_KEY";

/// Error bodies are cut to this many characters before logging.
const MAX_ERROR_BODY: usize = 500;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 2],
    temperature: f64,
    max_tokens: u32,
    response_format: Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Decision oracle backed by a chat-completions model.
pub struct ChatOracle {
    http: Client,
    endpoint: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    api_key: SecretString,
}

impl std::fmt::Debug for ChatOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOracle")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ChatOracle {
    /// Creates a client; every call is bounded by `config.timeout_secs`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &OracleConfig, api_key: SecretString) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build oracle HTTP client")?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_key,
        })
    }

    /// Creates a client with the key read from `ORACLE_API_KEY`.
    ///
    /// # Errors
    /// Returns error if the variable is missing or empty.
    pub fn from_env(config: &OracleConfig) -> anyhow::Result<Self> {
        let key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("missing environment variable: {API_KEY_ENV}"))?;
        Self::new(config, SecretString::from(key))
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn body<'a>(&'a self, request: &DecisionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_message(request),
                },
                ChatMessage {
                    role: "user",
                    content: user_message(request),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": SCHEMA_NAME,
                    "strict": true,
                    "schema": response_schema(),
                },
            }),
        }
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_BODY).collect()
}

/// Removes a surrounding markdown code fence some models add despite the schema.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}

fn map_send_error(err: &reqwest::Error) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout(err.to_string())
    } else {
        OracleError::Transport(err.to_string())
    }
}

/// Extracts the structured reply from a completion body.
fn parse_completion(body: &str) -> Result<RawDecision, OracleError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| OracleError::Malformed(format!("response body is not a chat completion: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| OracleError::Malformed("completion has no choices".to_string()))?;

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(OracleError::Refused(refusal));
    }

    let content = choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| {
            OracleError::Malformed(format!(
                "empty reply (finish_reason: {})",
                choice.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

    RawDecision::parse(strip_code_fence(&content))
        .map_err(|e| OracleError::Malformed(format!("reply is not JSON: {e}")))
}

#[async_trait]
impl DecisionOracle for ChatOracle {
    async fn consult(&self, request: &DecisionRequest) -> Result<RawDecision, OracleError> {
        tracing::debug!(
            model = %self.model,
            allowed = %request.allowed_tokens(),
            market_available = request.market_available,
            "Consulting oracle"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| map_send_error(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| map_send_error(&e))?;

        if !status.is_success() {
            return Err(OracleError::api(status.as_u16(), truncate(&text)));
        }

        parse_completion(&text)
    }
}
