//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::{Router, body::Body};

use campus::ai::chat::{Chat, ChatBuilder};
use campus::api::AppState;
use campus::api::app;
use campus::core::Credential;
use campus::openai::{
    Completion, CompletionClient, CompletionError, CompletionRequest, CompletionResult,
};

pub const TEST_KEY: &str = "sk-or-v1-test-0123456789abcdef";

/// Completion client that answers from a fixed result and counts
/// how many times it was called.
pub struct StubClient {
    result: CompletionResult,
    calls: AtomicUsize,
}

impl StubClient {
    pub fn replying(content: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Completion {
                content: content.to_string(),
                total_tokens: Some(12),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: CompletionError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(
        &self,
        _request: &CompletionRequest,
        _credential: &Credential,
    ) -> CompletionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

fn test_chat(client: Arc<dyn CompletionClient>) -> Chat {
    ChatBuilder::new(
        Credential::parse(TEST_KEY).expect("Invalid test key"),
        "openai/gpt-4o-mini",
    )
    .client(client)
    .build()
    .expect("Failed to build chat")
}

/// Creates a test application router backed by `client`.
pub fn test_app_with(client: Arc<dyn CompletionClient>) -> Router {
    let app_state = AppState::new(test_chat(client));
    app(Arc::new(RwLock::new(app_state)))
}

/// Creates a test application with a session cap, returning the
/// shared state alongside the router so tests can inspect it.
pub fn test_app_with_limit(
    reply: &str,
    max_sessions: usize,
) -> (Router, Arc<RwLock<AppState>>) {
    let app_state = AppState::with_limits(
        test_chat(StubClient::replying(reply)),
        max_sessions,
        Duration::from_secs(3600),
    );
    let shared_state = Arc::new(RwLock::new(app_state));
    (app(Arc::clone(&shared_state)), shared_state)
}

pub fn test_app(reply: &str) -> Router {
    test_app_with(StubClient::replying(reply))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    let body = body_to_string(body).await;
    serde_json::from_str(&body).expect("Body is not JSON")
}
