//! Classified failures for a completion turn.

use thiserror::Error;

const EXCERPT_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// Credential missing or not matching the provider's key format.
    #[error("API key is missing or invalid")]
    CredentialInvalid,

    #[error("Request timed out")]
    Timeout,

    #[error("Connection to the completion endpoint failed")]
    ConnectionFailed,

    /// Provider rejected the credential (401).
    #[error("Completion endpoint rejected the API key")]
    AuthRejected,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("HTTP Error {status}: {excerpt}")]
    HttpError { status: u16, excerpt: String },

    /// 2xx response without any usable choice.
    #[error("No response received from the AI model")]
    EmptyResponse,

    #[error("Message is empty")]
    EmptyInput,

    #[error("Unexpected error: {0}")]
    Unclassified(String),
}

impl CompletionError {
    /// Classify a non-2xx response by its status code.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Self::AuthRejected,
            429 => Self::RateLimited,
            _ => Self::HttpError {
                status,
                excerpt: excerpt(body),
            },
        }
    }

    /// Classify a transport level failure from `reqwest`.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() {
            Self::ConnectionFailed
        } else {
            Self::Unclassified(err.to_string())
        }
    }

    /// Text shown to the user in place of the assistant's reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::CredentialInvalid => {
                "Invalid API key. Expected format: sk-or-v1-...".to_string()
            }
            Self::Timeout => "Request timed out. Please try again.".to_string(),
            Self::ConnectionFailed => {
                "Connection error. Please check your internet connection.".to_string()
            }
            Self::AuthRejected => {
                "Invalid API key. Please check your API key configuration.".to_string()
            }
            Self::RateLimited => {
                "Rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            Self::HttpError { status, excerpt } if excerpt.is_empty() => {
                format!("HTTP Error {}", status)
            }
            Self::HttpError { status, excerpt } => format!("HTTP Error {}: {}", status, excerpt),
            Self::EmptyResponse => "No response received from the AI model.".to_string(),
            Self::EmptyInput => "Please enter a question.".to_string(),
            Self::Unclassified(msg) => format!("Unexpected error: {}", msg),
        }
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    let mut out: String = trimmed.chars().take(EXCERPT_MAX_CHARS).collect();
    if trimmed.chars().count() > EXCERPT_MAX_CHARS {
        out.push_str("...");
    }
    out
}
