//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::ai::chat::{Message, SessionStats};

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatRequest {
    // Absent or unknown ids start a new session
    pub session_id: Option<String>,
    pub message: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub success: bool,
}

#[derive(Serialize)]
pub struct ChatTranscriptResponse {
    pub session_id: String,
    pub transcript: Vec<Message>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ResetResponse {
    pub session_id: String,
}

#[derive(Serialize)]
pub struct ChatStatsResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub stats: SessionStats,
}
