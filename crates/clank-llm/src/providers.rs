//! Chat-completion providers over HTTP.
//!
//! OpenAI, Groq, Anyscale and Fireworks share the OpenAI `chat/completions`
//! format. Anthropic uses the Messages API with the system prompt lifted out
//! of the conversation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use clank_core::{Error, LmConfig, Result};

use crate::backends::{find_backend, Backend};
use crate::types::{ChatMessage, Completion, LanguageModel, TokenCount};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// A `LanguageModel` backed by a hosted provider.
pub struct HttpLanguageModel {
    client: Client,
    backend: &'static Backend,
    url: String,
    api_key: String,
    max_tokens: usize,
    temperature: f64,
    attempts: usize,
}

impl HttpLanguageModel {
    /// Resolve the configured backend key and its provider credentials.
    pub fn from_config(config: &LmConfig) -> Result<Self> {
        if config.backend.is_empty() {
            return Err(Error::Config("CLANK_ENGINE_LM_BACKEND is not set".into()));
        }

        let backend = find_backend(&config.backend)
            .ok_or_else(|| Error::Config(format!("Unknown LM backend: {}", config.backend)))?;

        let api_key = backend
            .provider
            .api_key(config)
            .ok_or_else(|| {
                Error::Config(format!(
                    "No API key configured for provider {} (backend {})",
                    backend.provider, backend.key
                ))
            })?
            .to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            backend,
            url: backend.provider.chat_url().to_string(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            attempts: config.attempts.max(1),
        })
    }

    /// Point the provider at a different base URL (proxies, local gateways).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn backend(&self) -> &'static Backend {
        self.backend
    }

    fn request_body(&self, messages: &[ChatMessage]) -> Value {
        if self.backend.provider.is_openai_compatible() {
            openai_body(self.backend.model, messages, self.temperature, self.max_tokens)
        } else {
            anthropic_body(self.backend.model, messages, self.temperature, self.max_tokens)
        }
    }

    async fn send_once(&self, body: &Value) -> std::result::Result<Value, Attempt> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(body);

        request = if self.backend.provider.is_openai_compatible() {
            request.header("Authorization", format!("Bearer {}", self.api_key))
        } else {
            request
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
        };

        let response = request
            .send()
            .await
            .map_err(|e| Attempt::Retry(Error::Http(format!("Request failed: {}", e))))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Error::Upstream {
                status: status.as_u16(),
                body,
            };
            return Err(if is_retryable(status) {
                Attempt::Retry(error)
            } else {
                Attempt::Fail(error)
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Attempt::Retry(Error::Http(format!("Invalid response body: {}", e))))
    }
}

/// Outcome of a failed attempt.
enum Attempt {
    Retry(Error),
    Fail(Error),
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        let body = self.request_body(messages);
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;

        loop {
            debug!(
                "Completion request to {} with model {} (attempt {}/{})",
                self.backend.provider, self.backend.model, attempt, self.attempts
            );

            match self.send_once(&body).await {
                Ok(value) => {
                    return if self.backend.provider.is_openai_compatible() {
                        parse_openai(&value)
                    } else {
                        parse_anthropic(&value)
                    };
                }
                Err(Attempt::Fail(e)) => return Err(e),
                Err(Attempt::Retry(e)) if attempt >= self.attempts => return Err(e),
                Err(Attempt::Retry(e)) => {
                    warn!(
                        "{} call failed, retrying in {:?}: {}",
                        self.backend.provider, backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
            }
        }
    }
}

pub(crate) fn openai_body(
    model: &str,
    messages: &[ChatMessage],
    temperature: f64,
    max_tokens: usize,
) -> Value {
    let msgs: Vec<Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    json!({
        "model": model,
        "messages": msgs,
        "temperature": temperature,
        "max_tokens": max_tokens,
    })
}

pub(crate) fn anthropic_body(
    model: &str,
    messages: &[ChatMessage],
    temperature: f64,
    max_tokens: usize,
) -> Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect();

    let conversation: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": conversation,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });

    if !system.is_empty() {
        body["system"] = json!(system.join("\n\n"));
    }

    body
}

pub(crate) fn parse_openai(value: &Value) -> Result<Completion> {
    let content = value["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| Error::Inference("Completion has no message content".into()))?;

    let usage = match (
        value["usage"]["prompt_tokens"].as_u64(),
        value["usage"]["completion_tokens"].as_u64(),
    ) {
        (Some(prompt), Some(completion)) => Some(TokenCount { prompt, completion }),
        _ => None,
    };

    Ok(Completion {
        content: content.to_string(),
        usage,
    })
}

pub(crate) fn parse_anthropic(value: &Value) -> Result<Completion> {
    let blocks = value["content"]
        .as_array()
        .ok_or_else(|| Error::Inference("Message has no content blocks".into()))?;

    let content: String = blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect();

    let usage = match (
        value["usage"]["input_tokens"].as_u64(),
        value["usage"]["output_tokens"].as_u64(),
    ) {
        (Some(prompt), Some(completion)) => Some(TokenCount { prompt, completion }),
        _ => None,
    };

    Ok(Completion { content, usage })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: &str) -> LmConfig {
        LmConfig {
            backend: backend.into(),
            max_tokens: 1024,
            temperature: 0.7,
            attempts: 3,
            timeout: Duration::from_secs(59),
            openai_api_key: Some("sk-test".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config() {
        let model = HttpLanguageModel::from_config(&config("openai/gpt-4o-mini")).unwrap();
        assert_eq!(model.backend().model, "gpt-4o-mini");
    }

    #[test]
    fn test_missing_backend_is_config_error() {
        let err = HttpLanguageModel::from_config(&config("")).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        let err = HttpLanguageModel::from_config(&config("mistral/7b")).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = HttpLanguageModel::from_config(&config("anthropic/claude-3.5-haiku"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_anthropic_body_lifts_system() {
        let messages = vec![ChatMessage::system("rules"), ChatMessage::user("hello")];
        let body = anthropic_body("claude-3-5-haiku-20241022", &messages, 0.7, 1024);
        assert_eq!(body["system"], "rules");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_openai_body_keeps_system() {
        let messages = vec![ChatMessage::system("rules"), ChatMessage::user("hello")];
        let body = openai_body("gpt-4o", &messages, 0.7, 1024);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn test_parse_openai() {
        let value = json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"output\": 1}"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        });
        let completion = parse_openai(&value).unwrap();
        assert_eq!(completion.content, "{\"output\": 1}");
        assert_eq!(
            completion.usage,
            Some(TokenCount {
                prompt: 12,
                completion: 3
            })
        );
        assert!(parse_openai(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_parse_anthropic() {
        let value = json!({
            "content": [{"type": "text", "text": "hello "}, {"type": "text", "text": "there"}],
            "usage": {"input_tokens": 5, "output_tokens": 2}
        });
        let completion = parse_anthropic(&value).unwrap();
        assert_eq!(completion.content, "hello there");
        assert_eq!(completion.usage.unwrap().completion, 2);
    }
}
