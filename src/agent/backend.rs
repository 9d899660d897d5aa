//! Generative-text backend
//!
//! The decision engine talks to a [`GenerativeBackend`]; the production
//! implementation is an OpenAI-compatible chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::{AgentConfig, Endpoints};

/// Failure of a generation request
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("generative backend is not configured")]
    Unconfigured,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response contained no text")]
    EmptyResponse,
}

/// Sampling parameters of a generation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&AgentConfig> for GenerationOptions {
    fn from(config: &AgentConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Text generation collaborator
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, BackendError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct OpenAiBackend {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
            model: "gpt-3.5-turbo".to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Build a client from resolved endpoints, `None` when no API key is set
    pub fn from_endpoints(
        endpoints: &Endpoints,
        config: &AgentConfig,
    ) -> Result<Option<Self>, BackendError> {
        let Some(key) = endpoints.openai_api_key.clone() else {
            return Ok(None);
        };
        Ok(Some(
            Self::new(key, endpoints.openai_base_url.clone())?.with_model(config.model.clone()),
        ))
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, BackendError> {
        let payload = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        tracing::debug!(model = %self.model, "Requesting chat completion");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(BackendError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    #[test]
    fn test_from_endpoints_without_key() {
        let endpoints = Endpoints::resolve(Network::Testnet, |_| None);
        let backend = OpenAiBackend::from_endpoints(&endpoints, &AgentConfig::default()).unwrap();
        assert!(backend.is_none());
    }

    #[test]
    fn test_completions_url() {
        let backend = OpenAiBackend::new(
            SecretString::from("sk-test".to_string()),
            "https://api.example.com/v1/",
        )
        .unwrap()
        .with_model("gpt-4o-mini");
        assert_eq!(
            backend.completions_url(),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(backend.model, "gpt-4o-mini");
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        }))
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("hello"));

        let empty: ChatResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.choices.is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let options = GenerationOptions::from(&AgentConfig::default());
        assert_eq!(options.max_tokens, 300);
        assert!((options.temperature - 0.8).abs() < f32::EPSILON);
    }
}
