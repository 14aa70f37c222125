use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation is not configured")]
    Disabled,
    #[error("text generation returned an empty response")]
    EmptyResponse,
    #[error("text generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// One-shot text generation: a system instruction plus a prompt in, text out.
/// Any provider with this shape is substitutable; tests use a scripted fake.
pub trait Generate: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GenerationConfig {
    /// The API key only ever comes from the environment. Returns None when
    /// it is absent or blank, which disables the helper.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("HUB_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("HUB_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("HUB_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Blocking client for an OpenAI-style chat/completions endpoint.
pub struct GenerationClient {
    client: Client,
    config: Option<GenerationConfig>,
}

impl GenerationClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GenerationConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GenerationConfig>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

impl Generate for GenerationClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.4,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json()?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unconfigured_client_is_disabled() {
        let client = GenerationClient::new(None);

        assert!(!client.enabled());
        assert_matches!(
            client.generate("system", "prompt"),
            Err(GenerationError::Disabled)
        );
    }

    #[test]
    fn configured_client_reports_enabled() {
        let client = GenerationClient::new(Some(GenerationConfig {
            base_url: "http://localhost:1".into(),
            api_key: "key".into(),
            model: "test-model".into(),
        }));

        assert!(client.enabled());
    }

    #[test]
    fn chat_request_serializes_system_and_user_roles() {
        let payload = ChatRequest {
            model: "m".into(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "be nice".into(),
                },
                ChatMessage {
                    role: "user",
                    content: "hello".into(),
                },
            ],
            temperature: 0.4,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["model"], "m");
    }

    #[test]
    fn chat_response_extracts_first_choice() {
        let body = r#"{"choices": [{"message": {"content": "  hi there  "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap();
        assert_eq!(content.trim(), "hi there");
    }

    #[test]
    fn chat_response_with_no_content_is_none() {
        let body = r#"{"choices": [{"message": {}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();

        assert!(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .is_none());
    }
}
