use crate::completion::{build_http_client, send_completion};
use crate::models::{ChatMessage, CompletionRequest, ModelConfig};
use anyhow::Result;
use log::info;
use reqwest::Client;

/// Image description through a multimodal chat model.
pub struct VisionClient {
    client: Client,
    config: ModelConfig,
}

impl VisionClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        info!("Initializing VisionClient for model {}", config.model);
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    pub async fn describe_image(&self, image_url: &str, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage::user_with_image(prompt, image_url)],
            temperature: self.config.temperature,
            max_tokens: None,
            max_completion_tokens: Some(self.config.max_tokens),
            top_p: self.config.top_p,
            stream: Some(false),
        };

        send_completion(&self.client, &self.config, &request).await
    }
}
