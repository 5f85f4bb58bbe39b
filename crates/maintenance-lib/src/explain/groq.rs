//! Explanation client for the Groq chat-completions API
//!
//! Groq exposes an OpenAI-compatible `/chat/completions` endpoint; one
//! non-streaming request is made per report.

use super::{ExplanationProvider, DEFAULT_EXPLANATION_TIMEOUT};
use crate::error::ExplanationError;
use crate::models::{Observation, PredictionResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

const SYSTEM_PROMPT: &str = "You are a construction maintenance expert.";

/// Maximum number of error-body characters kept in an error
const MAX_ERROR_BODY: usize = 200;

/// Groq client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GroqConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_GROQ_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_GROQ_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.4
}

fn default_max_tokens() -> u32 {
    200
}

fn default_timeout_secs() -> u64 {
    DEFAULT_EXPLANATION_TIMEOUT.as_secs()
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Configuration from `GROQ_API_KEY`, if set and non-empty
    pub fn from_env() -> Option<Self> {
        std::env::var(GROQ_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Prompt sent to the language model for one prediction
pub fn build_prompt(observation: &Observation, prediction: &PredictionResult) -> String {
    format!(
        "Material: {}\n\
         Age: {} days\n\
         Usage: {}\n\
         Humidity: {}\n\
         Load stress: {}\n\
         Cracks visible: {}\n\
         Last maintenance: {} days\n\
         \n\
         Prediction: {}\n\
         Risk confidence: {:.2}%\n\
         \n\
         Explain the condition, causes, and risks briefly.",
        observation.material_type,
        observation.material_age_days,
        observation.usage_frequency,
        observation.humidity_exposure,
        observation.load_stress_level,
        observation.cracks_visible,
        observation.last_maintenance_days,
        prediction.label,
        prediction.confidence,
    )
}

/// Explanation provider backed by Groq
pub struct GroqExplainer {
    client: Client,
    endpoint: String,
    config: GroqConfig,
}

impl GroqExplainer {
    pub fn new(config: GroqConfig) -> Result<Self, ExplanationError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ExplanationError::Transport(e.to_string()))?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    fn map_transport(&self, e: reqwest::Error) -> ExplanationError {
        if e.is_timeout() {
            ExplanationError::Timeout(self.config.timeout())
        } else {
            ExplanationError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ExplanationProvider for GroqExplainer {
    async fn explain(
        &self,
        observation: &Observation,
        prediction: &PredictionResult,
    ) -> Result<String, ExplanationError> {
        let prompt = build_prompt(observation, prediction);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(endpoint = %self.endpoint, model = %self.config.model, "Requesting explanation");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExplanationError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExplanationError::MalformedResponse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ExplanationError::MalformedResponse("no choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        let content = content.trim();
        if content.is_empty() {
            return Err(ExplanationError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}
