use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub const MINILM_DIMENSION: usize = 384;

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_token: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub dimensions: usize,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            base_url: "https://router.huggingface.co/hf-inference/models".to_string(),
            timeout_secs: 30,
            dimensions: MINILM_DIMENSION,
        }
    }
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

/// Client for the hosted sentence-transformers feature-extraction pipeline.
pub struct HuggingFaceClient {
    config: HuggingFaceConfig,
    client: Client,
}

impl HuggingFaceClient {
    pub fn new(config: HuggingFaceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/pipeline/feature-extraction",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = FeatureExtractionRequest {
            inputs: &texts,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if !self.config.api_token.is_empty() {
            builder = builder.bearer_auth(&self.config.api_token);
        }

        let response = builder
            .send()
            .await
            .context("Failed to send request to HuggingFace inference API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "HuggingFace API returned error {}: {}",
                status,
                error_text
            ));
        }

        let embeddings: Vec<Vec<f32>> = response
            .json()
            .await
            .context("Failed to parse HuggingFace API response")?;

        if embeddings.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "HuggingFace API returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            ));
        }

        tracing::debug!(
            "Embedded {} texts with {}",
            embeddings.len(),
            self.config.model
        );

        Ok(embeddings)
    }
}
