/// LLM Client: the single point of entry for all model calls in the interviewer.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// Interview and screening code depend on the `LlmGateway` trait, never on `LlmClient`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Authentication rejected by LLM provider (status {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("Rate limited by LLM provider: {0}")]
    RateLimited(String),

    #[error("Transient network error: {0}")]
    Transient(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode LLM response: {0}")]
    Decode(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Stable machine-readable code for API error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            LlmError::Authentication { .. } => "LLM_AUTHENTICATION",
            LlmError::RateLimited(_) => "LLM_RATE_LIMITED",
            LlmError::Transient(_) => "LLM_UNAVAILABLE",
            LlmError::Api { .. } | LlmError::Decode(_) | LlmError::EmptyContent => "LLM_ERROR",
        }
    }
}

/// Speaker of a chat message as the provider sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A text-generation backend: one system instruction plus an ordered history in, one text out.
///
/// Implementations must be stateless per call and safe to share across tasks.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, system: &str, history: &[ChatMessage]) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Extracts the non-blank text of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// OpenAI chat-completions client shared by every session and screening run.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl LlmClient {
    pub fn new(api_key: String, config: &Config) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .map_err(|e| LlmError::Transient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}{}",
                config.openai_base_url.trim_end_matches('/'),
                CHAT_COMPLETIONS_PATH
            ),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmGateway for LlmClient {
    /// Single attempt, no retry: failures surface to the caller immediately.
    async fn generate(&self, system: &str, history: &[ChatMessage]) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system,
        });
        messages.extend(history.iter().map(|m| WireMessage {
            role: match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: &m.content,
        }));

        let request_body = ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                warn!("LLM request failed before a response: {e}");
                LlmError::Transient(e.to_string())
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {}: {}", status, message);
            return Err(classify_status(status, message));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        if let Some(usage) = &completion.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "LLM call succeeded"
            );
        }

        completion
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

fn classify_status(status: StatusCode, message: String) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Authentication {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(message),
        s if s.is_server_error() => LlmError::Transient(format!("status {}: {message}", s.as_u16())),
        s => LlmError::Api {
            status: s.as_u16(),
            message,
        },
    }
}

/// Strips ``` code fences from LLM output, whatever language tag follows the opening marker.
///
/// Fence markers left anywhere else in the text are removed as well; models that ignore
/// the "no markdown" instruction do not always put them at the edges.
pub fn strip_json_fences(text: &str) -> String {
    let text = text.trim();
    let inner = match text.strip_prefix("```") {
        // The rest of the opening line is the tag (`json`, `JSON`, `javascript`, ...).
        Some(stripped) => match stripped.split_once('\n') {
            Some((_, body)) => body.trim_start(),
            None => stripped
                .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
                .trim_start(),
        },
        None => text,
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);

    inner.replace("```json", "").replace("```", "").trim().to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_with_any_tag() {
        for tag in ["JSON", "javascript", "Json5"] {
            let input = format!("```{tag}\n{{\"key\": \"value\"}}\n```");
            assert_eq!(strip_json_fences(&input), "{\"key\": \"value\"}");
        }
        assert_eq!(
            strip_json_fences("```JSON {\"key\": 1}```"),
            "{\"key\": 1}"
        );
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_with_leading_prose_marker() {
        let input = "Here you go ```json {\"score\": 5} ```";
        assert_eq!(strip_json_fences(input), "Here you go  {\"score\": 5}");
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "bad key".into()),
            LlmError::Authentication { status: 401, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            LlmError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "upstream".into()),
            LlmError::Transient(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "bad model".into()),
            LlmError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_response_text_skips_blank_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "   "}}], "usage": null}"#,
        )
        .unwrap();
        assert!(response.text().is_none());

        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "Hello"}}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 1}}"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("Hello"));
    }

    #[test]
    fn test_endpoint_is_built_from_base_url() {
        let config = Config::from_lookup(|key| match key {
            "OPENAI_BASE_URL" => Some("http://localhost:9000/".to_string()),
            _ => None,
        })
        .unwrap();
        let client = LlmClient::new("sk-test".to_string(), &config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9000/v1/chat/completions");
        assert_eq!(client.model(), "gpt-4o");
    }
}
