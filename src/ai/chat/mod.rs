mod core;
mod models;

pub use self::core::{Chat, ChatBuilder, TurnOutcome, build_request};
pub use self::models::{Conversation, Message, SessionStats};
