use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::document::DocumentContext;
use crate::services::session_service::SessionService;

pub const NEW_DOCUMENT_ANNOUNCEMENT: &str =
    "I've just received a new document. Feel free to ask me questions about it.";
pub const FAILURE_REPLY: &str = "Sorry, something went wrong.";
pub const EMPTY_REPLY: &str = "Sorry, I didn't get a proper response.";
pub const DEFAULT_GREETING: &str = "Hello! I'm your AI assistant. Ask me anything.";

const DOCUMENT_GREETINGS: [&str; 4] = [
    "Hello! I'm your AI assistant. I've read the document you uploaded. Feel free to ask me any questions about it.",
    "Hi there! I've analyzed your document and I'm ready to chat about it. What would you like to know?",
    "Hey! I've gone through your document and I'm here to help. What can I explain for you?",
    "Welcome! I've processed your document and I'm ready to discuss it. What questions do you have?",
];

/// Exchanges kept for the conversation.
const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatExchange {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn reply(
        &self,
        input: &str,
        context: &DocumentContext,
        history: &[ChatExchange],
    ) -> Result<String>;
}

/// Where the assistant reads the current document context from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn current_context(&self) -> Result<DocumentContext>;
}

#[async_trait]
impl ContextSource for SessionService {
    async fn current_context(&self) -> Result<DocumentContext> {
        self.document()
    }
}

/// Voice output of the assistant.
#[cfg_attr(test, mockall::automock)]
pub trait Narrator: Send + Sync {
    fn speak(&self, text: &str);
}

pub struct TracingNarrator;

impl Narrator for TracingNarrator {
    fn speak(&self, text: &str) {
        tracing::info!(chars = text.len(), "Assistant speaks: {}", text);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextChange {
    Unchanged,
    /// Taken over without announcement: the first context seen, or one
    /// without content.
    Adopted,
    NewDocument,
}

/// Detects when the document behind the conversation changes.
#[derive(Debug, Default)]
pub struct ContextWatcher {
    seen_any: bool,
    fingerprint: Option<String>,
}

impl ContextWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, context: &DocumentContext) -> ContextChange {
        let first = !self.seen_any;
        self.seen_any = true;

        if !context.has_content() {
            return ContextChange::Adopted;
        }

        let fingerprint = context.fingerprint();
        if self.fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return ContextChange::Unchanged;
        }
        self.fingerprint = Some(fingerprint);

        if first {
            ContextChange::Adopted
        } else {
            ContextChange::NewDocument
        }
    }
}

#[derive(Debug, Default)]
struct Conversation {
    context: DocumentContext,
    watcher: ContextWatcher,
    history: VecDeque<ChatExchange>,
    transcript: VecDeque<ChatMessage>,
}

impl Conversation {
    fn post(&mut self, sender: Sender, text: &str) {
        if self.transcript.len() >= HISTORY_LIMIT * 2 {
            self.transcript.pop_front();
        }
        self.transcript.push_back(ChatMessage {
            sender,
            text: text.to_string(),
            at: Utc::now(),
        });
    }

    fn record_exchange(&mut self, user: &str, assistant: &str) {
        if self.history.len() >= HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(ChatExchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
    }
}

/// Resets the busy flag when a reply finishes or is abandoned.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AssistantService {
    responder: Arc<dyn ChatResponder>,
    narrator: Arc<dyn Narrator>,
    busy: AtomicBool,
    conversation: Mutex<Conversation>,
}

impl AssistantService {
    pub fn new(responder: Arc<dyn ChatResponder>, narrator: Arc<dyn Narrator>) -> Self {
        Self {
            responder,
            narrator,
            busy: AtomicBool::new(false),
            conversation: Mutex::new(Conversation::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Conversation>> {
        self.conversation
            .lock()
            .map_err(|_| Error::Internal("assistant lock poisoned".to_string()))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn context(&self) -> Result<DocumentContext> {
        Ok(self.lock()?.context.clone())
    }

    pub fn history(&self) -> Result<Vec<ChatExchange>> {
        Ok(self.lock()?.history.iter().cloned().collect())
    }

    pub fn transcript(&self) -> Result<Vec<ChatMessage>> {
        Ok(self.lock()?.transcript.iter().cloned().collect())
    }

    /// Polls the context source once. Returns true when a new document was
    /// announced.
    pub async fn refresh(&self, source: &dyn ContextSource) -> Result<bool> {
        let context = source.current_context().await?;

        let change = {
            let mut conversation = self.lock()?;
            let change = conversation.watcher.observe(&context);
            if change != ContextChange::Unchanged {
                conversation.context = context;
            }
            if change == ContextChange::NewDocument {
                conversation.post(Sender::Assistant, NEW_DOCUMENT_ANNOUNCEMENT);
            }
            change
        };

        if change == ContextChange::NewDocument {
            tracing::info!("Document context changed");
            self.narrator.speak(NEW_DOCUMENT_ANNOUNCEMENT);
            return Ok(true);
        }
        Ok(false)
    }

    /// Answers one user message. Returns `None` without doing anything when
    /// a previous reply is still outstanding.
    pub async fn ask(&self, input: &str) -> Result<Option<String>> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::BadRequest("No input provided".to_string()));
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Chat input ignored while a reply is pending");
            return Ok(None);
        }
        let _busy = BusyGuard(&self.busy);

        let (context, history) = {
            let mut conversation = self.lock()?;
            conversation.post(Sender::User, input);
            (
                conversation.context.clone(),
                conversation.history.iter().cloned().collect::<Vec<_>>(),
            )
        };

        let reply = match self.responder.reply(input, &context, &history).await {
            Ok(text) if text.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Chat reply failed");
                FAILURE_REPLY.to_string()
            }
        };

        {
            let mut conversation = self.lock()?;
            conversation.post(Sender::Assistant, &reply);
            conversation.record_exchange(input, &reply);
        }
        self.narrator.speak(&reply);

        Ok(Some(reply))
    }

    pub fn greeting(&self) -> Result<String> {
        if !self.lock()?.context.has_content() {
            return Ok(DEFAULT_GREETING.to_string());
        }
        let greeting = DOCUMENT_GREETINGS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DEFAULT_GREETING);
        Ok(greeting.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(text: &str) -> DocumentContext {
        DocumentContext {
            extracted_text: text.to_string(),
            explanation: "Summary".to_string(),
            audio_file: None,
        }
    }

    fn quiet_narrator() -> Arc<dyn Narrator> {
        let mut narrator = MockNarrator::new();
        narrator.expect_speak().return_const(());
        Arc::new(narrator)
    }

    #[test]
    fn watcher_announces_only_later_changes() {
        let mut watcher = ContextWatcher::new();
        assert_eq!(watcher.observe(&document("first")), ContextChange::Adopted);
        assert_eq!(watcher.observe(&document("first")), ContextChange::Unchanged);
        assert_eq!(
            watcher.observe(&document("second")),
            ContextChange::NewDocument
        );
        assert_eq!(watcher.observe(&document("")), ContextChange::Adopted);
        assert_eq!(
            watcher.observe(&document("third")),
            ContextChange::NewDocument
        );
    }

    #[test]
    fn watcher_announces_first_document_after_empty_start() {
        let mut watcher = ContextWatcher::new();
        assert_eq!(watcher.observe(&document("  ")), ContextChange::Adopted);
        assert_eq!(
            watcher.observe(&document("uploaded")),
            ContextChange::NewDocument
        );
    }

    #[tokio::test]
    async fn refresh_narrates_new_documents() {
        let mut narrator = MockNarrator::new();
        narrator
            .expect_speak()
            .withf(|text: &str| text == NEW_DOCUMENT_ANNOUNCEMENT)
            .times(1)
            .return_const(());
        let assistant = AssistantService::new(Arc::new(MockChatResponder::new()), Arc::new(narrator));

        let mut source = MockContextSource::new();
        let mut calls = 0;
        source.expect_current_context().times(3).returning(move || {
            calls += 1;
            Ok(document(if calls < 3 { "one" } else { "two" }))
        });

        assert!(!assistant.refresh(&source).await.unwrap());
        assert!(!assistant.refresh(&source).await.unwrap());
        assert!(assistant.refresh(&source).await.unwrap());
        assert_eq!(assistant.context().unwrap().extracted_text, "two");
        let transcript = assistant.transcript().unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].sender, Sender::Assistant);
    }

    #[tokio::test]
    async fn ask_replies_with_document_context() {
        let mut responder = MockChatResponder::new();
        responder
            .expect_reply()
            .withf(|input: &str, context: &DocumentContext, history: &[ChatExchange]| {
                input == "What is it about?"
                    && context.extracted_text == "Plants"
                    && history.is_empty()
            })
            .times(1)
            .returning(|_, _, _| Ok("  It is about plants. ".to_string()));
        let assistant = AssistantService::new(Arc::new(responder), quiet_narrator());
        let mut source = MockContextSource::new();
        source
            .expect_current_context()
            .returning(|| Ok(document("Plants")));
        assistant.refresh(&source).await.unwrap();

        let reply = assistant.ask(" What is it about? ").await.unwrap();

        assert_eq!(reply.as_deref(), Some("It is about plants."));
        assert_eq!(
            assistant.history().unwrap(),
            vec![ChatExchange {
                user: "What is it about?".into(),
                assistant: "It is about plants.".into(),
            }]
        );
        assert!(!assistant.is_busy());
    }

    #[tokio::test]
    async fn responder_failures_become_apologies() {
        let mut responder = MockChatResponder::new();
        let mut calls = 0;
        responder
            .expect_reply()
            .times(2)
            .returning(move |_, _, _| {
                calls += 1;
                if calls == 1 {
                    Err(Error::Generation("down".into()))
                } else {
                    Ok("   ".into())
                }
            });
        let assistant = AssistantService::new(Arc::new(responder), quiet_narrator());

        assert_eq!(
            assistant.ask("hi").await.unwrap().as_deref(),
            Some(FAILURE_REPLY)
        );
        assert_eq!(
            assistant.ask("hello?").await.unwrap().as_deref(),
            Some(EMPTY_REPLY)
        );
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let assistant =
            AssistantService::new(Arc::new(MockChatResponder::new()), quiet_narrator());
        assert!(matches!(
            assistant.ask("   ").await,
            Err(Error::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn input_is_ignored_while_a_reply_is_pending() {
        let assistant =
            AssistantService::new(Arc::new(MockChatResponder::new()), quiet_narrator());
        assistant.busy.store(true, Ordering::Release);

        assert_eq!(assistant.ask("anyone?").await.unwrap(), None);
        assert!(assistant.transcript().unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_capped() {
        let mut responder = MockChatResponder::new();
        responder
            .expect_reply()
            .returning(|input, _, _| Ok(format!("re: {}", input)));
        let assistant = AssistantService::new(Arc::new(responder), quiet_narrator());

        for i in 0..(HISTORY_LIMIT + 3) {
            assistant.ask(&format!("message {}", i)).await.unwrap();
        }

        let history = assistant.history().unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].user, "message 3");
        assert!(assistant.transcript().unwrap().len() <= HISTORY_LIMIT * 2);
    }

    #[tokio::test]
    async fn greeting_depends_on_document() {
        let assistant =
            AssistantService::new(Arc::new(MockChatResponder::new()), quiet_narrator());
        assert_eq!(assistant.greeting().unwrap(), DEFAULT_GREETING);

        let mut source = MockContextSource::new();
        source
            .expect_current_context()
            .returning(|| Ok(document("Some text")));
        assistant.refresh(&source).await.unwrap();
        assert!(DOCUMENT_GREETINGS.contains(&assistant.greeting().unwrap().as_str()));
    }
}
