use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::render::SourceRenderer;
use crate::webhook::ChatReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Map<String, Value>>,
}

/// Conversation kept for the lifetime of one chat process.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        });
    }

    pub fn push_assistant(&mut self, reply: ChatReply) {
        self.turns.push(ChatTurn {
            role: Role::Assistant,
            content: reply.answer,
            sources: reply.sources,
        });
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The whole conversation, with sources rendered without saving images again.
    pub fn replay(&self, renderer: &SourceRenderer) -> String {
        self.turns
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    Role::User => "You",
                    Role::Assistant => "Assistant",
                };
                format!(
                    "{}: {}\n{}",
                    speaker,
                    turn.content,
                    renderer.render_saved(&turn.sources)
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn should_keep_turns_in_order() {
        let mut session = ChatSession::new();
        assert!(session.is_empty());

        session.push_user("What changed?");
        session.push_assistant(ChatReply::answer_only("Prices rose."));

        let roles: Vec<Role> = session.turns().iter().map(|turn| turn.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(session.turns()[1].content, "Prices rose.");
    }

    #[test]
    fn should_replay_answers_with_sources() {
        let mut session = ChatSession::new();
        session.push_user("Where?");
        let Value::Object(source) = json!({"type": "Text", "page_number": 1, "source": "a.txt", "content": "Here."}) else {
            unreachable!()
        };
        session.push_assistant(ChatReply {
            answer: "Here.".to_string(),
            sources: vec![source],
        });

        let replay = session.replay(&SourceRenderer::new("unused"));

        assert!(replay.starts_with("You: Where?\nAssistant: Here.\n📖 Source Context\nSource 1\n"));
        assert!(replay.contains("- File: a.txt\n"));
    }

    #[test]
    fn should_replay_image_sources_without_touching_image_dir() {
        let dir = TempDir::new().unwrap();
        let image_dir = dir.path().join("images");
        let mut session = ChatSession::new();
        session.push_user("Show the chart");
        let Value::Object(source) = json!({
            "type": "Image",
            "page_number": 5,
            "image_name": "deck_page_5_img_1.png",
            "image_base64": STANDARD.encode(b"png-bytes"),
            "imgbb_url": "https://i.ibb.co/chart.png"
        }) else {
            unreachable!()
        };
        session.push_assistant(ChatReply {
            answer: "Here it is.".to_string(),
            sources: vec![source],
        });

        let replay = session.replay(&SourceRenderer::new(&image_dir));

        assert!(!image_dir.exists());
        assert!(replay.contains("- Image from page 5: https://i.ibb.co/chart.png\n"));
    }
}
