#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use docquiz_backend::{
    build_router,
    config::Config,
    error::{Error, Result},
    models::{document::DocumentContext, generation::GenerationRequest},
    services::{
        ai_service::QuestionGenerator,
        assistant_service::{ChatExchange, ChatResponder, Narrator},
    },
    AppState,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

pub const SCENARIO_QUIZ: &str = r#"[
    {"question": "What is the capital of France?", "format": "mcq", "option": ["Paris", "Rome", "Berlin"], "answer": "Paris", "explanation": "Paris is the capital.", "difficulty": "easy"},
    {"question": "How many days are in a week?", "format": "short_answer", "option": ["7", "seven"], "explanation": "A week has seven days."}
]"#;

/// Replays canned generator answers in order and records every request.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<Vec<Result<String>>>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(Error::Generation("no scripted reply left".into())))
    }
}

pub struct EchoResponder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ChatResponder for EchoResponder {
    async fn reply(
        &self,
        input: &str,
        context: &DocumentContext,
        history: &[ChatExchange],
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "{} | doc:{} | turns:{}",
            input,
            context.has_content(),
            history.len()
        ))
    }
}

pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn speak(&self, _text: &str) {}
}

pub fn app(generator: Arc<ScriptedGenerator>) -> Router {
    let state = AppState::with_collaborators(
        generator,
        Arc::new(EchoResponder {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(SilentNarrator),
    );
    build_router(state, &Config::for_tests())
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, json)
}
