//! Core `ChatCompleter` trait and `ApiCompleter` implementation.
//!
//! `ApiCompleter` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint.  All connection details come from [`LlmConfig`]; nothing is
//! hardcoded.  The collaborator owns its own retry/fallback policy — the
//! orchestrator only distinguishes `Ok` from `Err`.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::conversation::{ConversationTurn, Speaker};
use crate::language::LanguageTag;
use crate::llm::prompt::system_prompt;

// ---------------------------------------------------------------------------
// CompletionError
// ---------------------------------------------------------------------------

/// Errors that can occur during a completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("completion request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse completion response: {0}")]
    Parse(String),

    /// The model returned a response with no usable text content.
    #[error("completion returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CompletionRequest / ChatCompleter
// ---------------------------------------------------------------------------

/// One turn's worth of input for the language-model collaborator.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// The visitor's final transcript.
    pub message: &'a str,
    /// Active conversation language; the reply must be in it.
    pub language: LanguageTag,
    /// Trailing window of prior turns, oldest first.
    pub context: &'a [ConversationTurn],
}

/// Async trait for the language-model collaborator.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn ChatCompleter>`.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, CompletionError>;
}

// ---------------------------------------------------------------------------
// ApiCompleter
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Works with OpenAI, Groq, Together.ai, LM Studio, vLLM, Ollama in OpenAI
/// mode — any provider speaking the chat-completions wire format.
pub struct ApiCompleter {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ApiCompleter {
    /// Build an `ApiCompleter` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Assemble the chat message list: system prompt, context window, then
    /// the current message.
    fn build_messages(request: &CompletionRequest<'_>) -> Vec<serde_json::Value> {
        let mut messages = Vec::with_capacity(request.context.len() + 2);
        messages.push(serde_json::json!({
            "role": "system",
            "content": system_prompt(request.language),
        }));

        for turn in request.context {
            let role = match turn.speaker {
                Speaker::User => "user",
                Speaker::Assistant => "assistant",
            };
            messages.push(serde_json::json!({ "role": role, "content": turn.text }));
        }

        messages.push(serde_json::json!({ "role": "user", "content": request.message }));
        messages
    }
}

#[async_trait]
impl ChatCompleter for ApiCompleter {
    /// Send `request` to the configured endpoint.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// local providers that require no authentication.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages":    Self::build_messages(&request),
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  self.config.max_tokens,
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Parse(e.to_string()))?;

        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(CompletionError::EmptyResponse)?
            .trim()
            .to_string();

        if reply.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }

        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            enabled: true,
            base_url: "http://localhost:11434".into(),
            api_key: api_key.map(|s| s.to_string()),
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 256,
            timeout_secs: 15,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _completer = ApiCompleter::from_config(&make_config(None));
        let _completer = ApiCompleter::from_config(&make_config(Some("")));
        let _completer = ApiCompleter::from_config(&make_config(Some("sk-test-1234")));
    }

    /// Verify that `ApiCompleter` is object-safe (usable as `dyn ChatCompleter`).
    #[test]
    fn completer_is_object_safe() {
        let completer: Box<dyn ChatCompleter> =
            Box::new(ApiCompleter::from_config(&make_config(None)));
        drop(completer);
    }

    #[test]
    fn messages_start_with_system_and_end_with_user() {
        let context = [
            ConversationTurn::user("Привет", LanguageTag::Ru),
            ConversationTurn::assistant("Здравствуйте!", LanguageTag::Ru),
        ];
        let request = CompletionRequest {
            message: "Где столовая?",
            language: LanguageTag::Ru,
            context: &context,
        };

        let messages = ApiCompleter::build_messages(&request);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Привет");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["role"], "user");
        assert_eq!(messages[3]["content"], "Где столовая?");
    }

    #[test]
    fn empty_context_yields_system_plus_message() {
        let request = CompletionRequest {
            message: "hello",
            language: LanguageTag::En,
            context: &[],
        };
        let messages = ApiCompleter::build_messages(&request);
        assert_eq!(messages.len(), 2);
    }
}
