use async_trait::async_trait;
use devflow_core::config::AiConfig;
use std::time::Duration;

use crate::error::GenerationError;
use crate::types::{
    ApiErrorBody, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GenerationRequest, ModelTier, Part,
};
use crate::Result;

// ─── Generator ────────────────────────────────────────────────────────────

/// The one capability every AI feature is built on: send a prompt, get text.
///
/// Implementations make a single attempt; callers never retry.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

// ─── GeminiClient ─────────────────────────────────────────────────────────

/// [`Generator`] backed by the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    pro_model: String,
    flash_model: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            pro_model: config.pro_model.clone(),
            flash_model: config.flash_model.clone(),
        })
    }

    /// Build a client with the API key taken from the environment. Without
    /// a key the client is still usable, but every call fails with
    /// [`GenerationError::MissingApiKey`].
    pub fn from_env(config: &AiConfig) -> Result<Self> {
        let key = AiConfig::api_key().unwrap_or_default();
        if key.is_empty() {
            tracing::warn!("no generation API key in the environment; AI features are disabled");
        }
        Self::new(config, key)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Pro => &self.pro_model,
            ModelTier::Flash => &self.flash_model,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        if !self.has_api_key() {
            return Err(GenerationError::MissingApiKey);
        }
        let model = self.model(request.tier).to_string();
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: Some(request.prompt),
                }],
            }],
            generation_config: request.schema.map(|schema| GenerationConfig {
                response_mime_type: "application/json".into(),
                response_schema: schema.to_json(),
            }),
        };

        tracing::debug!(%model, "generateContent request");
        let response = self
            .http
            .post(self.endpoint(&model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%model, error = %e, "model request failed");
                GenerationError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| text.trim().to_string());
            tracing::error!(%model, status = status.as_u16(), %message, "model API error");
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!(%model, error = %e, "unreadable model response");
            GenerationError::Transport(e.to_string())
        })?;
        parsed.text().ok_or(GenerationError::EmptyResponse)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
