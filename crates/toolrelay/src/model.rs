//! Generative model client.

use std::time::Duration;

use async_trait::async_trait;
use relayconf::ModelConfig;
use tracing::{debug, warn};

use crate::error::ModelApiError;
use crate::gemini::{Candidate, FunctionDeclaration, GenerateRequest, GenerateResponse, Turn};

/// Default bound on one HTTPS round trip.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends a conversation plus tool catalog to the model and returns the first
/// candidate.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(
        &self,
        turns: &[Turn],
        tools: &[FunctionDeclaration],
    ) -> Result<Candidate, ModelApiError>;
}

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct ModelClientOptions {
    pub token: Option<String>,
    pub insecure_skip_verify: bool,
    pub timeout: Duration,
}

impl Default for ModelClientOptions {
    fn default() -> Self {
        Self {
            token: None,
            insecure_skip_verify: false,
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }
}

impl From<&ModelConfig> for ModelClientOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            token: config.token.clone(),
            insecure_skip_verify: config.insecure_skip_verify,
            timeout: config.timeout(),
        }
    }
}

/// POSTs `generateContent` requests to a single endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>, options: ModelClientOptions) -> Result<Self, ModelApiError> {
        let endpoint = endpoint.into();

        if options.insecure_skip_verify {
            warn!(%endpoint, "TLS certificate verification is disabled for the model endpoint");
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure_skip_verify)
            .build()
            .map_err(ModelApiError::Client)?;

        Ok(Self {
            client,
            endpoint,
            token: options.token,
            timeout: options.timeout,
        })
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelApiError> {
        Self::new(config.endpoint.clone(), ModelClientOptions::from(config))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> ModelApiError {
        if err.is_timeout() {
            ModelApiError::TimedOut {
                after: self.timeout,
            }
        } else {
            ModelApiError::Transport(err)
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    #[tracing::instrument(
        name = "model.generate",
        skip_all,
        fields(turns = turns.len(), tools = tools.len())
    )]
    async fn generate(
        &self,
        turns: &[Turn],
        tools: &[FunctionDeclaration],
    ) -> Result<Candidate, ModelApiError> {
        let body = GenerateRequest::new(turns, tools);

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ModelApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| ModelApiError::Decode {
                message: e.to_string(),
                body: text.clone(),
            })?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(ModelApiError::NoCandidates)?;

        debug!(
            finish_reason = %candidate.finish_reason,
            parts = candidate.content.parts.len(),
            "model responded"
        );

        Ok(candidate)
    }
}
