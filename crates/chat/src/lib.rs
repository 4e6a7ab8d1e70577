pub mod render;
pub mod session;
pub mod webhook;

pub use render::SourceRenderer;
pub use session::{ChatSession, ChatTurn, Role};
pub use webhook::{ChatReply, WebhookClient};
