pub mod completion;
pub mod models;
pub mod vision;

pub use completion::LlmClient;
pub use models::{ChatContent, ChatMessage, ContentPart, ModelConfig};
pub use vision::VisionClient;
