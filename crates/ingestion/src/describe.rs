use anyhow::Result;
use llm::VisionClient;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::imgbb::ImgbbClient;

pub const DESCRIPTION_PLACEHOLDER: &str = "Image description unavailable due to error.";

type TextFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// Publishes a local image and returns a URL the vision model can reach.
pub trait ImageHost: Send + Sync {
    fn upload<'a>(&'a self, path: &'a Path) -> TextFuture<'a>;
}

/// Produces a text description for a hosted image.
pub trait ImageDescriber: Send + Sync {
    fn describe<'a>(&'a self, image_url: &'a str) -> TextFuture<'a>;
}

impl ImageHost for ImgbbClient {
    fn upload<'a>(&'a self, path: &'a Path) -> TextFuture<'a> {
        Box::pin(self.upload(path))
    }
}

pub struct VisionDescriber {
    client: VisionClient,
    prompt: String,
}

impl VisionDescriber {
    pub fn new(client: VisionClient, prompt: impl Into<String>) -> Self {
        Self {
            client,
            prompt: prompt.into(),
        }
    }
}

impl ImageDescriber for VisionDescriber {
    fn describe<'a>(&'a self, image_url: &'a str) -> TextFuture<'a> {
        Box::pin(self.client.describe_image(image_url, &self.prompt))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutcome {
    pub description: String,
    pub hosted_url: Option<String>,
}

/// Upload then describe. Any failure degrades to the placeholder text.
pub struct ImageProcessor {
    host: Box<dyn ImageHost>,
    describer: Box<dyn ImageDescriber>,
}

impl ImageProcessor {
    pub fn new(host: Box<dyn ImageHost>, describer: Box<dyn ImageDescriber>) -> Self {
        Self { host, describer }
    }

    pub async fn process(&self, path: &Path, page_number: u32) -> ImageOutcome {
        let hosted_url = match self.host.upload(path).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Error processing image on page {}: {}", page_number, e);
                return ImageOutcome {
                    description: DESCRIPTION_PLACEHOLDER.to_string(),
                    hosted_url: None,
                };
            }
        };

        let description = match self.describer.describe(&hosted_url).await {
            Ok(description) => description,
            Err(e) => {
                tracing::warn!("Error processing image on page {}: {}", page_number, e);
                DESCRIPTION_PLACEHOLDER.to_string()
            }
        };

        ImageOutcome {
            description,
            hosted_url: Some(hosted_url),
        }
    }
}
