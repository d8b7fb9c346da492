use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::CompletionError;
use crate::core::{AppConfig, Credential, DEFAULT_TIMEOUT_SECS};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as it goes over the wire. Only role and content are
/// part of the contract.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ApiMessage {
    pub role: Role,
    pub content: String,
}

impl ApiMessage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ApiMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub content: String,
    /// `usage.total_tokens` when the provider reports it
    pub total_tokens: Option<u64>,
}

pub type CompletionResult = Result<Completion, CompletionError>;

/// Performs a single completion call. Implementations must not retry
/// and must not touch conversation state.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest, credential: &Credential)
    -> CompletionResult;
}

/// Completion client for an OpenAI compatible chat completions
/// endpoint.
#[derive(Clone, Debug)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    referer: Option<String>,
    title: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            referer: None,
            title: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut client = Self::new(&config.api_url).timeout(config.timeout);
        client.referer = config.referer.clone();
        client.title = config.title.clone();
        client
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Descriptive headers some providers use for attribution. They
    /// have no effect on the completion.
    pub fn attribution(mut self, referer: &str, title: &str) -> Self {
        self.referer = Some(referer.to_string());
        self.title = Some(title.to_string());
        self
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        credential: &Credential,
    ) -> CompletionResult {
        if !credential.is_valid() {
            tracing::warn!("Refusing completion call with invalid credential");
            return Err(CompletionError::CredentialInvalid);
        }

        tracing::debug!(
            "Completion request: model={} messages={} temperature={} key={}",
            request.model,
            request.messages.len(),
            request.temperature,
            credential.redacted()
        );

        let mut builder = self
            .client
            .post(&self.url)
            .bearer_auth(credential.expose())
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request);
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Completion request failed: {}", e);
            CompletionError::from_transport(&e)
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!("Reading completion response failed: {}", e);
            CompletionError::from_transport(&e)
        })?;

        if !status.is_success() {
            tracing::warn!("Completion endpoint returned {}", status);
            return Err(CompletionError::from_status(status.as_u16(), &body));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Parsing completion response failed for {}\nError:{}", body, e);
            CompletionError::Unclassified(format!("Invalid JSON in response: {}", e))
        })?;

        parse_completion(&value)
    }
}

/// Extract the first choice's content from a successful response.
pub fn parse_completion(resp: &Value) -> CompletionResult {
    let first = resp["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or(CompletionError::EmptyResponse)?;
    let content = first["message"]["content"]
        .as_str()
        .filter(|content| !content.trim().is_empty())
        .ok_or(CompletionError::EmptyResponse)?;
    let total_tokens = resp["usage"]["total_tokens"].as_u64();

    Ok(Completion {
        content: content.to_string(),
        total_tokens,
    })
}
