use anyhow::{Context, Result};
use rag_core::config::ImageHostConfig;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

/// Uploads images to ImgBB so the vision model can fetch them by URL.
pub struct ImgbbClient {
    client: Client,
    upload_url: String,
    api_key: Option<String>,
}

impl ImgbbClient {
    pub fn new(config: &ImageHostConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            api_key,
        })
    }

    /// Returns the public URL of the uploaded image.
    pub async fn upload(&self, path: &Path) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("IMGBB_API_KEY is not set"))?;

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        let form = reqwest::multipart::Form::new().part(
            "image",
            reqwest::multipart::Part::bytes(data).file_name(file_name),
        );

        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("key", api_key)])
            .multipart(form)
            .send()
            .await
            .context("ImgBB upload request failed")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("ImgBB upload failed: {}", body));
        }

        let upload: UploadResponse = response
            .json()
            .await
            .context("Failed to parse ImgBB response")?;

        tracing::debug!("Uploaded {} to {}", path.display(), upload.data.url);
        Ok(upload.data.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> ImgbbClient {
        let config = ImageHostConfig {
            upload_url: format!("{}/1/upload", server.uri()),
            ..ImageHostConfig::default()
        };
        ImgbbClient::new(&config, api_key.map(String::from)).unwrap()
    }

    fn image_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("report_page_1_img_1.jpeg");
        std::fs::write(&path, b"\xFF\xD8\xFF\xD9").unwrap();
        path
    }

    #[tokio::test]
    async fn should_upload_image_and_return_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/upload"))
            .and(query_param("key", "imgbb_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"url": "https://i.ibb.co/abc/report_page_1_img_1.jpeg"},
                "success": true,
                "status": 200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let url = client_for(&server, Some("imgbb_test"))
            .upload(&image_file(&dir))
            .await
            .unwrap();

        assert_eq!(url, "https://i.ibb.co/abc/report_page_1_img_1.jpeg");
    }

    #[tokio::test]
    async fn should_fail_with_response_body_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/upload"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid API v1 key."))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let error = client_for(&server, Some("bad"))
            .upload(&image_file(&dir))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "ImgBB upload failed: Invalid API v1 key.");
    }

    #[tokio::test]
    async fn should_fail_without_api_key() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        let error = client_for(&server, None)
            .upload(&image_file(&dir))
            .await
            .unwrap_err();

        assert!(error.to_string().contains("IMGBB_API_KEY"));
    }
}
