//! The core models for managing a stateful chat with an LLM. History
//! lives in memory for one session only.
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::openai::{ApiMessage, CompletionError, Role};

/// A single turn in the transcript. Fields are private so a message
/// can't be changed once it's recorded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Strip everything that isn't part of the wire contract
    pub fn to_api(&self) -> ApiMessage {
        ApiMessage::new(self.role, &self.content)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub messages_sent: usize,
    pub ai_responses: usize,
    pub total_tokens_used: u64,
}

/// Ordered history for one session. Append only except for `clear`
/// and `reset`.
#[derive(Clone, Debug)]
pub struct Conversation {
    session_id: String,
    messages: Vec<Message>,
    total_tokens_used: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            session_id: new_session_id(),
            messages: Vec::new(),
            total_tokens_used: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Record the user's question. Blank text is rejected.
    pub fn append_user(&mut self, text: &str) -> Result<&Message, CompletionError> {
        if text.trim().is_empty() {
            return Err(CompletionError::EmptyInput);
        }
        self.messages.push(Message::new(Role::User, text));
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Record the assistant's reply. Error text rendered for the user
    /// goes through here too.
    pub fn append_assistant(&mut self, text: &str) -> &Message {
        self.messages.push(Message::new(Role::Assistant, text));
        &self.messages[self.messages.len() - 1]
    }

    pub fn record_usage(&mut self, total_tokens: u64) {
        self.total_tokens_used = self.total_tokens_used.saturating_add(total_tokens);
    }

    /// Clear the history under a new session id. The token counter
    /// carries over.
    pub fn clear(&mut self) {
        let previous = std::mem::replace(&mut self.session_id, new_session_id());
        self.messages.clear();
        tracing::info!("Cleared session {} -> {}", previous, self.session_id);
    }

    /// Start over as a new session, zeroing the token counter too.
    pub fn reset(&mut self) {
        let previous = std::mem::replace(&mut self.session_id, new_session_id());
        self.messages.clear();
        self.total_tokens_used = 0;
        tracing::info!("Reset session {} -> {}", previous, self.session_id);
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            messages_sent: self.iter().filter(|m| m.role == Role::User).count(),
            ai_responses: self.iter().filter(|m| m.role == Role::Assistant).count(),
            total_tokens_used: self.total_tokens_used,
        }
    }
}

fn new_session_id() -> String {
    format!("conv_{}", Uuid::new_v4())
}
