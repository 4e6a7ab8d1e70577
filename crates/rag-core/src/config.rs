use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub image_host: ImageHostConfig,
    pub pgvector: PgVectorConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub dimensions: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            base_url: GROQ_BASE_URL.to_string(),
            temperature: 0.7,
            max_tokens: 512,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn with_env_overrides(&self) -> Self {
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| self.model.clone());
        Self {
            model,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub model: String,
    pub base_url: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            base_url: GROQ_BASE_URL.to_string(),
            prompt: "What's in this image?".to_string(),
            temperature: 1.0,
            max_completion_tokens: 1024,
            top_p: 1.0,
            timeout_secs: 120,
        }
    }
}

impl VisionConfig {
    pub fn with_env_overrides(&self) -> Self {
        let model = env::var("VISION_MODEL").unwrap_or_else(|_| self.model.clone());
        Self {
            model,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageHostConfig {
    pub upload_url: String,
    pub timeout_secs: u64,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            upload_url: "https://api.imgbb.com/1/upload".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PgVectorConfig {
    pub url: String,
}

impl PgVectorConfig {
    pub fn with_env_overrides(&self) -> Self {
        let url = env::var("PGVECTOR_URL")
            .or_else(|_| env::var("VECTOR_DB_URL"))
            .unwrap_or_else(|_| self.url.clone());
        Self { url }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub document_dir: String,
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
}

impl DataConfig {
    pub fn with_env_overrides(&self) -> Self {
        let document_dir = env::var("DOCS_PATH").unwrap_or_else(|_| self.document_dir.clone());
        Self {
            document_dir,
            image_dir: self.image_dir.clone(),
        }
    }
}

fn default_image_dir() -> String {
    "data/extracted_images".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub webhook_url: String,
    pub timeout_secs: u64,
    pub image_dir: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:5678/webhook/query".to_string(),
            timeout_secs: 3000,
            image_dir: "chat_images".to_string(),
        }
    }
}

impl ChatConfig {
    pub fn with_env_overrides(&self) -> Self {
        let webhook_url = env::var("WEBHOOK_URL").unwrap_or_else(|_| self.webhook_url.clone());
        Self {
            webhook_url,
            ..self.clone()
        }
    }
}

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// API keys are never read from the config file.
#[derive(Clone, Default, PartialEq)]
pub struct ApiKeys {
    pub groq: Option<String>,
    pub imgbb: Option<String>,
    pub huggingface: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self {
            groq: non_empty_var("GROQ_API_KEY"),
            imgbb: non_empty_var("IMGBB_API_KEY"),
            huggingface: non_empty_var("HUGGINGFACEHUB_API_TOKEN"),
        }
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("groq", &mask(&self.groq))
            .field("imgbb", &mask(&self.imgbb))
            .field("huggingface", &mask(&self.huggingface))
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_from_env() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| Self::default_config_path());
        Self::load(Path::new(&config_path))
    }

    pub fn default_config_path() -> String {
        "./config.toml".to_string()
    }

    /// Offline defaults: deterministic embeddings and an in-process vector store.
    pub fn development() -> Self {
        Self {
            embedding: EmbeddingConfig {
                provider: "fallback".to_string(),
                model: None,
                base_url: None,
                dimensions: None,
            },
            llm: LlmConfig::default(),
            vision: VisionConfig::default(),
            image_host: ImageHostConfig::default(),
            pgvector: PgVectorConfig {
                url: "memory://".to_string(),
            },
            data: DataConfig {
                document_dir: "./data/".to_string(),
                image_dir: default_image_dir(),
            },
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
            chat: ChatConfig::default(),
        }
    }

    pub fn with_env_overrides(&self) -> Self {
        Self {
            llm: self.llm.with_env_overrides(),
            vision: self.vision.with_env_overrides(),
            pgvector: self.pgvector.with_env_overrides(),
            data: self.data.with_env_overrides(),
            chat: self.chat.with_env_overrides(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[embedding]
provider = "huggingface"

[llm]

[pgvector]
url = "postgres://localhost:5432/ragchat"

[data]
document_dir = "./data/"
"#;

    #[test]
    fn should_deserialize_minimal_config_with_defaults() {
        let config: Config = toml::from_str(MINIMAL_TOML).unwrap();

        assert_eq!(config.embedding.provider, "huggingface");
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(
            config.vision.model,
            "meta-llama/llama-4-scout-17b-16e-instruct"
        );
        assert_eq!(config.vision.prompt, "What's in this image?");
        assert_eq!(config.image_host.upload_url, "https://api.imgbb.com/1/upload");
        assert_eq!(config.data.image_dir, "data/extracted_images");
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.chat.webhook_url, "http://localhost:5678/webhook/query");
        assert_eq!(config.chat.timeout_secs, 3000);
    }

    #[test]
    fn should_deserialize_full_config() {
        let toml_content = r#"
[embedding]
provider = "huggingface"
model = "sentence-transformers/all-MiniLM-L6-v2"
dimensions = 384

[llm]
model = "mixtral-8x7b-32768"
max_tokens = 1024

[vision]
prompt = "Describe the chart."

[pgvector]
url = "postgres://localhost:5432/ragchat"

[data]
document_dir = "./docs"
image_dir = "./docs/images"

[retrieval]
top_k = 8

[server]
bind_address = "127.0.0.1:9000"

[chat]
webhook_url = "http://n8n:5678/webhook/query"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.embedding.dimensions, Some(384));
        assert_eq!(config.llm.model, "mixtral-8x7b-32768");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.vision.prompt, "Describe the chart.");
        assert_eq!(config.data.image_dir, "./docs/images");
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.chat.webhook_url, "http://n8n:5678/webhook/query");
    }

    #[test]
    fn should_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.pgvector.url, "postgres://localhost:5432/ragchat");
        assert_eq!(config.data.document_dir, "./data/");
    }

    #[test]
    fn should_use_default_config_path() {
        assert_eq!(Config::default_config_path(), "./config.toml");
    }

    #[test]
    fn should_return_error_for_missing_file() {
        let result = Config::load(Path::new("/non/existent/path.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn should_return_error_when_required_section_missing() {
        let toml_content = r#"
[embedding]
provider = "huggingface"

[llm]
"#;
        let result: Result<Config, _> = toml::from_str(toml_content);
        assert!(result.is_err());
    }

    #[test]
    fn should_return_error_for_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"invalid toml content [[[").unwrap();

        let result = Config::load(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn should_build_offline_development_config() {
        let config = Config::development();

        assert_eq!(config.embedding.provider, "fallback");
        assert_eq!(config.pgvector.url, "memory://");
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn should_override_webhook_url_from_env() {
        env::set_var("WEBHOOK_URL", "http://override:5678/webhook/query");

        let chat = ChatConfig::default().with_env_overrides();

        assert_eq!(chat.webhook_url, "http://override:5678/webhook/query");
        assert_eq!(chat.timeout_secs, 3000);

        env::remove_var("WEBHOOK_URL");
    }

    #[test]
    fn should_not_leak_api_keys_in_debug_output() {
        let keys = ApiKeys {
            groq: Some("gsk_secret".to_string()), // pragma: allowlist secret
            imgbb: None,
            huggingface: None,
        };

        let debug = format!("{:?}", keys);

        assert!(!debug.contains("gsk_secret"));
        assert!(debug.contains("<set>"));
        assert!(debug.contains("<unset>"));
    }
}
