use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::ai::chat::{Chat, Conversation};
use crate::core::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_SECS};

/// A conversation shared between requests. The async mutex keeps
/// turns for the same session in order.
pub type SharedConversation = Arc<Mutex<Conversation>>;

struct SessionEntry {
    conversation: SharedConversation,
    last_active: Instant,
}

/// In memory sessions plus the shared `Chat`. Sessions are gone when
/// the process exits. The map never holds more than `max_sessions`
/// entries and sessions idle for longer than `idle_timeout` are
/// dropped the next time a session is started.
pub struct AppState {
    sessions: HashMap<String, SessionEntry>,
    max_sessions: usize,
    idle_timeout: Duration,
    pub chat: Chat,
}

impl AppState {
    pub fn new(chat: Chat) -> Self {
        Self::with_limits(
            chat,
            DEFAULT_MAX_SESSIONS,
            Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        )
    }

    pub fn with_limits(chat: Chat, max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            max_sessions: max_sessions.max(1),
            idle_timeout,
            chat,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Look up a session, or start a new one when the id is missing
    /// or unknown.
    pub fn session_or_new(&mut self, session_id: Option<&str>) -> SharedConversation {
        if let Some(entry) = session_id.and_then(|id| self.sessions.get_mut(id)) {
            entry.last_active = Instant::now();
            return Arc::clone(&entry.conversation);
        }
        self.insert(Conversation::new())
    }

    pub fn session(&self, session_id: &str) -> Option<SharedConversation> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(&entry.conversation))
    }

    /// Remove a session from the map. Turns already holding the
    /// conversation finish, but the id is no longer reachable.
    pub fn end_session(&mut self, session_id: &str) -> Option<SharedConversation> {
        let entry = self.sessions.remove(session_id)?;
        tracing::info!("Ended session {}", session_id);
        Some(entry.conversation)
    }

    /// Track a conversation under its current session id, making room
    /// first if needed.
    pub fn insert(&mut self, conversation: Conversation) -> SharedConversation {
        let id = conversation.session_id().to_string();
        self.adopt(id, Arc::new(Mutex::new(conversation)))
    }

    /// Track an existing shared conversation under `session_id`.
    pub fn adopt(
        &mut self,
        session_id: String,
        conversation: SharedConversation,
    ) -> SharedConversation {
        self.evict();
        tracing::info!("Tracking session {}", session_id);
        self.sessions.insert(
            session_id,
            SessionEntry {
                conversation: Arc::clone(&conversation),
                last_active: Instant::now(),
            },
        );
        conversation
    }

    // Drop idle sessions, then the least recently active ones until
    // there is room for one more.
    fn evict(&mut self) {
        let idle_timeout = self.idle_timeout;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.last_active.elapsed() < idle_timeout);

        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_active)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before - self.sessions.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} sessions", evicted);
        }
    }
}
