use std::sync::Arc;

use anyhow::{Context, Result};

use super::models::Conversation;
use crate::ai::prompt;
use crate::core::{
    AppConfig, Credential, DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
    KnowledgeBase, validate_temperature,
};
use crate::openai::{
    ApiMessage, CompletionClient, CompletionError, CompletionRequest, HttpCompletionClient, Role,
};

/// Build the payload for the next turn: one freshly built system
/// message followed by every message in the conversation, in order.
/// Nothing is dropped or summarized regardless of length.
pub fn build_request(
    conversation: &Conversation,
    system_prompt: &str,
    model: &str,
    temperature: f32,
    max_tokens: Option<u32>,
) -> CompletionRequest {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(ApiMessage::new(Role::System, system_prompt));
    messages.extend(conversation.iter().map(|m| m.to_api()));

    CompletionRequest {
        model: model.to_string(),
        messages,
        temperature,
        max_tokens,
        stream: false,
    }
}

/// Result of one turn as seen by the presentation layer. Failures
/// still carry a reply so they can be rendered like any other
/// assistant message.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub error: Option<CompletionError>,
}

impl TurnOutcome {
    fn ok(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            error: None,
        }
    }

    fn failed(err: CompletionError) -> Self {
        Self {
            reply: err.user_message(),
            error: Some(err),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Answers questions about the college using an OpenAI compatible
/// completion endpoint. Holds no conversation state itself, callers
/// own the `Conversation` and pass it in for each turn.
///
/// Use `ChatBuilder` to construct a valid `Chat`.
#[derive(Clone)]
pub struct Chat {
    client: Arc<dyn CompletionClient>,
    credential: Credential,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
}

impl Chat {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Same chat with a different model and/or temperature for
    /// callers that let the user pick them.
    pub fn with_settings(&self, model: Option<&str>, temperature: Option<f32>) -> Result<Self> {
        let mut chat = self.clone();
        if let Some(model) = model {
            chat.model = model.to_string();
        }
        if let Some(temperature) = temperature {
            validate_temperature(temperature)?;
            chat.temperature = temperature;
        }
        Ok(chat)
    }

    pub fn request_for(&self, conversation: &Conversation) -> CompletionRequest {
        build_request(
            conversation,
            &self.system_prompt,
            &self.model,
            self.temperature,
            self.max_tokens,
        )
    }

    /// Runs one turn: records the question, makes a single completion
    /// call, and records the reply (or the error text) as the
    /// assistant's message. Blank input is rejected before anything
    /// is recorded or sent.
    pub async fn turn(&self, conversation: &mut Conversation, text: &str) -> TurnOutcome {
        if let Err(err) = conversation.append_user(text) {
            return TurnOutcome::failed(err);
        }

        let request = self.request_for(conversation);
        let outcome = match self.client.complete(&request, &self.credential).await {
            Ok(completion) if completion.content.trim().is_empty() => {
                tracing::warn!(
                    "Blank reply for session {}",
                    conversation.session_id()
                );
                TurnOutcome::failed(CompletionError::EmptyResponse)
            }
            Ok(completion) => {
                if let Some(tokens) = completion.total_tokens {
                    conversation.record_usage(tokens);
                }
                TurnOutcome::ok(&completion.content)
            }
            Err(err) => {
                tracing::error!(
                    "Turn failed for session {}: {:?}",
                    conversation.session_id(),
                    err
                );
                TurnOutcome::failed(err)
            }
        };

        conversation.append_assistant(&outcome.reply);
        outcome
    }

    /// Single question with no prior history.
    pub async fn ask(&self, question: &str) -> TurnOutcome {
        let mut conversation = Conversation::new();
        self.turn(&mut conversation, question).await
    }
}

pub struct ChatBuilder {
    client: Option<Arc<dyn CompletionClient>>,
    credential: Credential,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    knowledge: KnowledgeBase,
}

impl ChatBuilder {
    pub fn new(credential: Credential, model: &str) -> Self {
        Self {
            client: None,
            credential,
            model: model.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            knowledge: KnowledgeBase::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_key.clone(), &config.model)
            .client(Arc::new(HttpCompletionClient::from_config(config)))
            .temperature(config.temperature)
            .max_tokens(config.max_tokens)
            .knowledge(config.knowledge.clone())
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn knowledge(mut self, knowledge: KnowledgeBase) -> Self {
        self.knowledge = knowledge;
        self
    }

    /// Fails when the credential is implausible so the session never
    /// starts, or when the temperature is out of range.
    pub fn build(self) -> Result<Chat> {
        if !self.credential.is_valid() {
            return Err(CompletionError::CredentialInvalid).context("Unable to start chat session");
        }
        validate_temperature(self.temperature)?;

        let templates = prompt::templates()?;
        let system_prompt = prompt::system_prompt(&templates, &self.knowledge)?;
        let client: Arc<dyn CompletionClient> = match self.client {
            Some(client) => client,
            None => Arc::new(HttpCompletionClient::new(DEFAULT_API_URL)),
        };

        Ok(Chat {
            client,
            credential: self.credential,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::{Completion, CompletionResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: &str = "sk-or-v1-0123456789abcdef";

    /// Returns a canned result and records every request it receives
    struct FakeClient {
        result: CompletionResult,
        calls: AtomicUsize,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl FakeClient {
        fn new(result: CompletionResult) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }

        fn replying(content: &str) -> Arc<Self> {
            Self::new(Ok(Completion {
                content: content.to_string(),
                total_tokens: Some(20),
            }))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn complete(
            &self,
            request: &CompletionRequest,
            _credential: &Credential,
        ) -> CompletionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.result.clone()
        }
    }

    fn chat_with(client: Arc<FakeClient>) -> Chat {
        ChatBuilder::new(Credential::parse(KEY).unwrap(), "openai/gpt-4o-mini")
            .client(client)
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_request_prepends_system_message() {
        let mut convo = Conversation::new();
        convo.append_user("q1").unwrap();
        convo.append_assistant("a1");
        convo.append_user("q2").unwrap();

        let req = build_request(&convo, "SYSTEM", "m", 0.5, Some(10));

        assert_eq!(req.messages.len(), convo.len() + 1);
        assert_eq!(req.messages[0], ApiMessage::new(Role::System, "SYSTEM"));
        assert_eq!(req.messages[1], ApiMessage::new(Role::User, "q1"));
        assert_eq!(req.messages[2], ApiMessage::new(Role::Assistant, "a1"));
        assert_eq!(req.messages[3], ApiMessage::new(Role::User, "q2"));
        assert_eq!(req.model, "m");
        assert_eq!(req.temperature, 0.5);
        assert_eq!(req.max_tokens, Some(10));
        assert!(!req.stream);
    }

    #[test]
    fn test_build_request_empty_conversation() {
        let req = build_request(&Conversation::new(), "SYSTEM", "m", 0.7, None);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, Role::System);
    }

    #[test]
    fn test_request_for_includes_full_knowledge_base() {
        let chat = chat_with(FakeClient::replying("ok"));
        let mut convo = Conversation::new();
        for i in 0..50 {
            convo.append_user(&format!("question {}", i)).unwrap();
            convo.append_assistant(&format!("answer {}", i));
        }

        let req = chat.request_for(&convo);

        assert_eq!(req.messages.len(), 101);
        assert_eq!(req.messages[0].role, Role::System);
        assert!(req.messages[0].content.contains(KnowledgeBase::default().text()));
        assert!(req.messages[1..].iter().all(|m| m.role != Role::System));
    }

    #[test]
    fn test_custom_knowledge() {
        let chat = ChatBuilder::new(Credential::parse(KEY).unwrap(), "m")
            .client(FakeClient::replying("ok"))
            .knowledge(KnowledgeBase::new("The canteen serves dosa."))
            .build()
            .unwrap();
        let req = chat.request_for(&Conversation::new());
        assert!(req.messages[0].content.contains("The canteen serves dosa."));
    }

    #[tokio::test]
    async fn test_turn_end_to_end() {
        let client = FakeClient::replying("Engineering, Business, Medicine.");
        let chat = chat_with(client.clone());
        let mut convo = Conversation::new();

        let outcome = chat
            .turn(&mut convo, "What programs does the college offer?")
            .await;

        assert!(outcome.success());
        assert_eq!(outcome.reply, "Engineering, Business, Medicine.");
        assert_eq!(convo.len(), 2);
        assert_eq!(convo.messages()[1].role(), Role::Assistant);
        assert_eq!(convo.messages()[1].content(), "Engineering, Business, Medicine.");
        assert_eq!(convo.stats().total_tokens_used, 20);
        assert_eq!(client.calls(), 1);

        let sent = client.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[1].content, "What programs does the college offer?");
    }

    #[tokio::test]
    async fn test_turn_sends_prior_history() {
        let client = FakeClient::replying("reply");
        let chat = chat_with(client.clone());
        let mut convo = Conversation::new();

        chat.turn(&mut convo, "first").await;
        chat.turn(&mut convo, "second").await;

        let sent = client.last_request.lock().unwrap().clone().unwrap();
        let roles: Vec<Role> = sent.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(convo.len(), 4);
    }

    #[tokio::test]
    async fn test_turn_rejects_blank_input_without_calling() {
        let client = FakeClient::replying("never");
        let chat = chat_with(client.clone());
        let mut convo = Conversation::new();

        let outcome = chat.turn(&mut convo, "   ").await;

        assert_eq!(outcome.error, Some(CompletionError::EmptyInput));
        assert!(convo.is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_turn_timeout_still_records_reply() {
        let client = FakeClient::new(Err(CompletionError::Timeout));
        let chat = chat_with(client.clone());
        let mut convo = Conversation::new();

        let outcome = chat.turn(&mut convo, "Hello?").await;

        assert!(!outcome.success());
        assert_eq!(outcome.error, Some(CompletionError::Timeout));
        assert_eq!(convo.len(), 2);
        assert!(!convo.messages()[1].content().is_empty());
        assert_eq!(convo.messages()[1].content(), CompletionError::Timeout.user_message());
        assert_eq!(convo.stats().total_tokens_used, 0);
    }

    #[tokio::test]
    async fn test_turn_blank_reply_is_empty_response() {
        let client = FakeClient::replying("  ");
        let chat = chat_with(client.clone());
        let mut convo = Conversation::new();

        let outcome = chat.turn(&mut convo, "Is there a swimming pool?").await;

        assert!(!outcome.success());
        assert_eq!(outcome.error, Some(CompletionError::EmptyResponse));
        assert_eq!(convo.len(), 2);
        assert_eq!(
            convo.messages()[1].content(),
            CompletionError::EmptyResponse.user_message()
        );
        assert!(convo.iter().all(|m| !m.content().trim().is_empty()));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_session_continues_after_failure() {
        let failing = FakeClient::new(Err(CompletionError::RateLimited));
        let mut convo = Conversation::new();
        chat_with(failing).turn(&mut convo, "one").await;

        let outcome = chat_with(FakeClient::replying("two")).turn(&mut convo, "again").await;
        assert!(outcome.success());
        assert_eq!(convo.len(), 4);
    }

    #[tokio::test]
    async fn test_ask_is_single_turn() {
        let client = FakeClient::replying("Call +91-422-2685000");
        let chat = chat_with(client.clone());

        let outcome = chat.ask("How can I contact Amrita College?").await;

        assert_eq!(outcome.reply, "Call +91-422-2685000");
        let sent = client.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.messages.len(), 2);
    }

    #[test]
    fn test_builder_rejects_invalid_credential() {
        let client = FakeClient::replying("never");
        let result = ChatBuilder::new(Credential::unchecked("sk-bad"), "m")
            .client(client.clone())
            .build();

        assert!(result.is_err());
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn test_builder_rejects_bad_temperature() {
        let result = ChatBuilder::new(Credential::parse(KEY).unwrap(), "m")
            .client(FakeClient::replying("x"))
            .temperature(1.5)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_with_settings() {
        let chat = chat_with(FakeClient::replying("x"));
        let tuned = chat.with_settings(Some("openai/gpt-4o"), Some(0.1)).unwrap();
        assert_eq!(tuned.model(), "openai/gpt-4o");
        assert_eq!(tuned.temperature(), 0.1);
        // Original is untouched
        assert_eq!(chat.model(), "openai/gpt-4o-mini");
        assert!(chat.with_settings(None, Some(2.0)).is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let chat = ChatBuilder::new(Credential::parse(KEY).unwrap(), "m")
            .client(FakeClient::replying("x"))
            .build()
            .unwrap();
        assert_eq!(chat.temperature(), DEFAULT_TEMPERATURE);
        let req = chat.request_for(&Conversation::new());
        assert_eq!(req.max_tokens, Some(DEFAULT_MAX_TOKENS));
    }
}
