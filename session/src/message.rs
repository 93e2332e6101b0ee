use serde::{Deserialize, Serialize};

/// Message roles as they appear in the conversation log.
///
/// `AssistantProvisional` marks the in-progress response placeholder. It is
/// replaced by a finalized `Assistant` entry when the stream ends and never
/// crosses the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    AssistantProvisional,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered conversation history.
///
/// Append-only, except that the single provisional entry may be replaced or
/// removed while a response streams in.
#[derive(Default, Clone)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// Replace the provisional entry's content, creating it when absent.
    ///
    /// The provisional entry always sits at the tail of the log.
    pub fn set_provisional(&mut self, content: impl Into<String>) {
        self.clear_provisional();
        self.messages
            .push(Message::new(Role::AssistantProvisional, content));
    }

    /// Drop the provisional entry if present.
    pub fn clear_provisional(&mut self) {
        self.messages
            .retain(|m| m.role != Role::AssistantProvisional);
    }

    /// Remove the provisional entry and append a finalized assistant
    /// message in its place.
    pub fn finalize_assistant(&mut self, content: impl Into<String>) {
        self.clear_provisional();
        self.push(Role::Assistant, content);
    }

    /// All entries, including any provisional one.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn provisional(&self) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.role == Role::AssistantProvisional)
    }

    /// Finalized entries only, in order, for request serialization.
    pub fn history(&self) -> Vec<chat::ChatMessage> {
        self.messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    Role::System => chat::ChatRole::System,
                    Role::User => chat::ChatRole::User,
                    Role::Assistant => chat::ChatRole::Assistant,
                    Role::AssistantProvisional => return None,
                };
                Some(chat::ChatMessage::new(role, m.content.clone()))
            })
            .collect()
    }
}
