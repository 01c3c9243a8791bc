//! OpenAI-compatible provider for embeddings and chat completions.
//!
//! Uses a blocking `reqwest` client: the pipeline is synchronous and the
//! embedding fan-out happens on the rayon pool. Transient failures (network
//! errors, 429, 5xx) are retried with exponential backoff until
//! `max_elapsed_secs` is spent; anything else fails immediately.

use backoff::{retry, ExponentialBackoff};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, EmbeddingRequest, EmbeddingResponse};
use super::{EmbeddingProvider, GenerationProvider};
use crate::error::{GenSurvError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_GEN_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_ELAPSED_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub base_url: String,
    /// Sent as a bearer token when present; local endpoints may not need one.
    pub api_key: Option<String>,
    pub embed_model: String,
    pub gen_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on time spent retrying a single call.
    pub max_elapsed_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            gen_model: DEFAULT_GEN_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 400,
            max_elapsed_secs: DEFAULT_MAX_ELAPSED_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Read configuration from `OPENAI_*` variables and `API_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            embed_model: std::env::var("OPENAI_EMBED_MODEL").unwrap_or(defaults.embed_model),
            gen_model: std::env::var("OPENAI_GEN_MODEL").unwrap_or(defaults.gen_model),
            max_elapsed_secs: std::env::var("API_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_elapsed_secs),
            ..defaults
        }
    }
}

pub struct OpenAIClient {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!(
            "Initializing OpenAI client: url={}, embed={}, gen={}",
            config.base_url, config.embed_model, config.gen_model
        );

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig::from_env();
        if config.api_key.is_none() && config.base_url == DEFAULT_BASE_URL {
            return Err(GenSurvError::Config(
                "OPENAI_API_KEY is required when using the default OpenAI endpoint".to_string(),
            ));
        }
        Self::new(config)
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// POST a JSON body, retrying transient failures.
    fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(Duration::from_secs(self.config.max_elapsed_secs)),
            ..Default::default()
        };

        let operation = || -> std::result::Result<T, backoff::Error<GenSurvError>> {
            let mut request = self.client.post(&url).json(body);
            if let Some(ref api_key) = self.config.api_key {
                request = request.bearer_auth(api_key);
            }

            let response = request
                .send()
                .map_err(|e| backoff::Error::transient(GenSurvError::NetworkError(e)))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<T>()
                    .map_err(|e| backoff::Error::permanent(GenSurvError::NetworkError(e)));
            }

            let text = response.text().unwrap_or_default();
            let error = GenSurvError::ApiError(format!("{} returned status {}: {}", endpoint, status, text));
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                warn!("{} returned status {}, retrying", endpoint, status);
                Err(backoff::Error::transient(error))
            } else {
                Err(backoff::Error::permanent(error))
            }
        };

        retry(backoff, operation).map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

impl EmbeddingProvider for OpenAIClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.embed_model,
            input: vec![text],
        };

        let response: EmbeddingResponse = self
            .post_json("/embeddings", &request)
            .map_err(|e| GenSurvError::Embedding(e.to_string()))?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| GenSurvError::Embedding("response contained no embedding".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

impl GenerationProvider for OpenAIClient {
    fn generate(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.gen_model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Requesting chat completion from {}", self.config.gen_model);
        let response: ChatCompletionResponse = self
            .post_json("/chat/completions", &request)
            .map_err(|e| GenSurvError::Generation(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| GenSurvError::Generation("response contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAIConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.embed_model, "text-embedding-3-small");
        assert_eq!(config.max_tokens, 400);
        assert!(config.api_key.is_none());
    }
}
