/// Client for the external advisory model (any OpenAI-compatible
/// `/chat/completions` endpoint; Together AI by default).
///
/// Transport errors, 429s and 5xx responses are retried with exponential
/// backoff plus jitter. Everything else is returned to the caller at once.
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1";
const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3-8B-Instruct-Lite";

#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    pub base_url: String,
    /// Bearer token. Local OpenAI-compatible hosts usually need none.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl AdvisorConfig {
    /// Load from the process environment.
    ///
    /// All settings are optional:
    /// - `ADVISOR_BASE_URL` (default: Together AI)
    /// - `ADVISOR_API_KEY`, falling back to `TOGETHER_API_KEY`
    /// - `ADVISOR_MODEL`, `ADVISOR_TEMPERATURE` (0.3), `ADVISOR_MAX_TOKENS` (500)
    /// - `ADVISOR_TIMEOUT_SECS` (30), `ADVISOR_MAX_RETRIES` (3)
    /// - `ADVISOR_RETRY_INITIAL_MS` (200), `ADVISOR_RETRY_MAX_MS` (5000)
    /// - `ADVISOR_MAX_ERROR_BODY_BYTES` (8 KiB)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |name: &str| -> Option<u64> { parse_var(&lookup, name) };

        let base_url = lookup("ADVISOR_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = lookup("ADVISOR_API_KEY")
            .or_else(|| lookup("TOGETHER_API_KEY"))
            .filter(|k| !k.trim().is_empty());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: lookup("ADVISOR_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_var(&lookup, "ADVISOR_TEMPERATURE").unwrap_or(0.3),
            max_tokens: parse_var(&lookup, "ADVISOR_MAX_TOKENS").unwrap_or(500),
            timeout: Duration::from_secs(parsed("ADVISOR_TIMEOUT_SECS").unwrap_or(30)),
            max_retries: parse_var(&lookup, "ADVISOR_MAX_RETRIES").unwrap_or(3),
            initial_backoff: Duration::from_millis(parsed("ADVISOR_RETRY_INITIAL_MS").unwrap_or(200)),
            max_backoff: Duration::from_millis(parsed("ADVISOR_RETRY_MAX_MS").unwrap_or(5_000)),
            max_error_body_bytes: parse_var(&lookup, "ADVISOR_MAX_ERROR_BODY_BYTES").unwrap_or(8 * 1024),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|s| s.trim().parse::<T>().ok())
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("advisor returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("advisor returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("advisor returned no completion text")]
    EmptyCompletion,
}

impl AdvisorError {
    /// Whether a fresh attempt might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AdvisorError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            AdvisorError::Upstream { status, .. } | AdvisorError::UpstreamBody { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            AdvisorError::InvalidJson(_) | AdvisorError::EmptyCompletion => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

#[derive(Clone)]
pub struct AdvisorClient {
    config: AdvisorConfig,
    http: reqwest::Client,
}

impl AdvisorClient {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let http = reqwest::Client::builder()
            .user_agent("ecooyster/advisor")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Send `messages` and return the first choice's text, trimmed.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AdvisorError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut attempt: u32 = 0;
        let response = loop {
            attempt += 1;
            match self.send(&url, &request).await {
                Ok(response) => break response,
                Err(e) if attempt <= self.config.max_retries && e.is_transient() => {
                    let delay = backoff_delay(self.config.initial_backoff, self.config.max_backoff, attempt - 1);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "advisor request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AdvisorError::EmptyCompletion)?;
        debug!(attempts = attempt, chars = text.len(), "advisor completion received");
        Ok(text)
    }

    async fn send(
        &self,
        url: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<CompletionResponse, AdvisorError> {
        let mut builder = self
            .http
            .post(url)
            .timeout(self.config.timeout)
            .json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&body)?);
        }
        Err(upstream_error(status, &body, self.config.max_error_body_bytes))
    }
}

fn upstream_error(status: StatusCode, body: &[u8], max_bytes: usize) -> AdvisorError {
    if let Ok(parsed) = serde_json::from_slice::<ErrorEnvelope>(body) {
        let message = parsed
            .error
            .message
            .unwrap_or_else(|| "unknown advisor error".to_string());
        return AdvisorError::Upstream { status, message };
    }
    let limited = &body[..body.len().min(max_bytes)];
    AdvisorError::UpstreamBody {
        status,
        body: String::from_utf8_lossy(limited).to_string(),
    }
}

/// `initial * 2^exponent`, capped at `max`, plus up to 25% jitter.
fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let factor = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let capped_ms = initial.as_millis().saturating_mul(factor).min(max.as_millis()) as u64;
    let jitter_ms = clock_jitter(std::cmp::max(1, capped_ms / 4));
    Duration::from_millis(capped_ms.saturating_add(jitter_ms))
}

fn clock_jitter(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);
    nanos % (max_inclusive + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AdvisorConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AdvisorConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn config_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.max_tokens, 500);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn config_overrides_and_key_fallback() {
        let config = config_from(&[
            ("ADVISOR_BASE_URL", "http://localhost:8001/v1/"),
            ("TOGETHER_API_KEY", "secret"),
            ("ADVISOR_MAX_TOKENS", "800"),
            ("ADVISOR_MAX_RETRIES", "not-a-number"),
        ]);
        assert_eq!(config.base_url, "http://localhost:8001/v1");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.max_tokens, 800);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let config = config_from(&[("ADVISOR_API_KEY", "  ")]);
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn transient_statuses() {
        let upstream = |status| AdvisorError::Upstream {
            status,
            message: String::new(),
        };
        assert!(upstream(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(upstream(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!upstream(StatusCode::UNAUTHORIZED).is_transient());
        assert!(!AdvisorError::EmptyCompletion.is_transient());
    }

    #[test]
    fn upstream_error_parses_envelope_or_truncates_body() {
        let parsed = upstream_error(
            StatusCode::BAD_REQUEST,
            br#"{"error":{"message":"model not found"}}"#,
            1024,
        );
        assert!(matches!(parsed, AdvisorError::Upstream { ref message, .. } if message == "model not found"));

        let raw = upstream_error(StatusCode::BAD_GATEWAY, b"<html>gateway down</html>", 6);
        assert!(matches!(raw, AdvisorError::UpstreamBody { ref body, .. } if body == "<html>"));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let initial = Duration::from_millis(100);
        let max = Duration::from_millis(1_000);
        let first = backoff_delay(initial, max, 0);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        let capped = backoff_delay(initial, max, 20);
        assert!(capped >= max && capped <= Duration::from_millis(1_250));
    }

    #[test]
    fn request_serializes_openai_shape() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("advise")];
        let request = CompletionRequest {
            model: "m",
            messages: &messages,
            temperature: 0.3,
            max_tokens: 500,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "advise");
        assert_eq!(json["max_tokens"], 500);
    }
}
