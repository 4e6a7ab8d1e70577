use crate::models::{ChatMessage, CompletionRequest, CompletionResponse, ModelConfig};
use anyhow::{Context, Result};
use log::{error, info};
use reqwest::Client;
use std::time::Duration;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Text completion against an OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmClient {
    client: Client,
    config: ModelConfig,
}

impl LlmClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        info!("Initializing LlmClient for model {}", config.model);
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends the prompt as a single user turn after the fixed system message.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: self.config.temperature,
            max_tokens: Some(self.config.max_tokens),
            max_completion_tokens: None,
            top_p: None,
            stream: None,
        };

        send_completion(&self.client, &self.config, &request).await
    }
}

pub(crate) fn build_http_client(config: &ModelConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

pub(crate) async fn send_completion(
    client: &Client,
    config: &ModelConfig,
    request: &CompletionRequest<'_>,
) -> Result<String> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("GROQ_API_KEY is not set"))?;

    info!("Sending request to model: {}", config.model);
    let response = client
        .post(config.completions_url())
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await
        .context("Failed to send request to LLM API")?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!("LLM API returned {}: {}", status, error_text);
        return Err(anyhow::anyhow!(
            "GROQ API error: {} - {}",
            status.as_u16(),
            error_text
        ));
    }

    let completion: CompletionResponse = response
        .json()
        .await
        .context("Failed to parse LLM API response")?;

    completion
        .first_content()
        .ok_or_else(|| anyhow::anyhow!("LLM API response contained no message content"))
}
