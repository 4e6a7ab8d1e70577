use anyhow::{Context, Result};
use rag_core::config::ChatConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const NO_ANSWER: &str = "⚠️ No answer returned.";
pub const FETCH_FAILED: &str = "❌ Error: Failed to fetch response.";

/// One answer from the workflow, with the sources it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    pub sources: Vec<Map<String, Value>>,
}

impl ChatReply {
    pub fn answer_only(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
        }
    }

    /// A list yields its first element; an object with `answer` is used as is.
    pub fn from_value(value: Value) -> Self {
        let reply = match value {
            Value::Array(items) => items.into_iter().next(),
            object @ Value::Object(_) if object.get("answer").is_some() => Some(object),
            _ => None,
        };

        let Some(Value::Object(mut reply)) = reply else {
            return Self::answer_only(NO_ANSWER);
        };

        let answer = match reply.remove("answer") {
            Some(Value::String(answer)) => answer,
            Some(Value::Null) | None => NO_ANSWER.to_string(),
            Some(other) => other.to_string(),
        };
        let sources = match reply.remove("sources") {
            Some(Value::Array(sources)) => sources
                .into_iter()
                .filter_map(|source| match source {
                    Value::Object(source) => Some(source),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        Self { answer, sources }
    }
}

/// Posts questions to the workflow webhook that fronts `/retrieve` and `/ask`.
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: config.webhook_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Never fails: transport and status errors become the answer text.
    pub async fn query(&self, text: &str) -> ChatReply {
        match self.send(text).await {
            Ok(Some(value)) => ChatReply::from_value(value),
            Ok(None) => ChatReply::answer_only(FETCH_FAILED),
            Err(e) => {
                tracing::warn!("Webhook request failed: {:#}", e);
                ChatReply::answer_only(format!("❌ Exception: {}", e))
            }
        }
    }

    async fn send(&self, text: &str) -> Result<Option<Value>> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "query": text }))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            tracing::warn!("Webhook returned status {}", response.status());
            return Ok(None);
        }

        Ok(Some(response.json::<Value>().await?))
    }
}
