mod config;
mod credential;
mod knowledge;

pub use config::{
    AppConfig, DEFAULT_API_URL, DEFAULT_MAX_SESSIONS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_SESSION_IDLE_SECS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, validate_temperature,
};
pub use credential::Credential;
pub use knowledge::{KNOWLEDGE_BASE, KnowledgeBase};
