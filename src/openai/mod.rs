mod core;
mod error;

pub use self::core::{
    ApiMessage, Completion, CompletionClient, CompletionRequest,
    CompletionResult, HttpCompletionClient, Role, parse_completion,
};
pub use self::error::CompletionError;
