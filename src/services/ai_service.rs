use crate::error::{Error, Result};
use crate::models::document::DocumentContext;
use crate::models::generation::GenerationRequest;
use crate::services::assistant_service::{ChatExchange, ChatResponder};
use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Number of past exchanges replayed to the model with each chat turn.
const CHAT_HISTORY_WINDOW: usize = 5;

/// Produces a serialized question set for the given source material.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AIService {
    pub fn new(api_key: String, base_url: String, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url,
            model,
        }
    }

    /// Asks the model for a new quiz and returns its raw serialized form.
    /// Validation is left to the caller.
    pub async fn generate_quiz(&self, request: &GenerationRequest) -> Result<String> {
        tracing::info!(
            previous = request.previous_questions.len(),
            difficulty = %request.difficulty,
            taxonomy = %request.taxonomy,
            format = %request.format,
            "Requesting new quiz"
        );

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": QUIZ_SYSTEM_PROMPT},
                {"role": "user", "content": quiz_prompt(request)}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.8
        });

        self.chat_completion(payload).await
    }

    pub async fn chat_reply(
        &self,
        input: &str,
        context: &DocumentContext,
        history: &[ChatExchange],
    ) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": chat_prompt(input, context, history)}
            ],
            "temperature": 0.7
        });
        let reply = self.chat_completion(payload).await?;
        Ok(reply.trim().to_string())
    }

    async fn chat_completion(&self, payload: JsonValue) -> Result<String> {
        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await
            .context("chat completion request failed")?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            tracing::error!(%status, "Chat completion rejected");
            return Err(Error::Generation(format!(
                "Model API error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res.json().await?;
        completion_content(&body)
            .ok_or_else(|| Error::Generation("Invalid completion response format".to_string()))
    }
}

#[async_trait]
impl QuestionGenerator for AIService {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.generate_quiz(request).await
    }
}

#[async_trait]
impl ChatResponder for AIService {
    async fn reply(
        &self,
        input: &str,
        context: &DocumentContext,
        history: &[ChatExchange],
    ) -> Result<String> {
        self.chat_reply(input, context, history).await
    }
}

const QUIZ_SYSTEM_PROMPT: &str = r#"You write quizzes that test understanding of a document.
Return a JSON object with a single field "questions" holding an array.
Each question object has:
  "question": the question text,
  "format": "mcq", "true_false" or "short_answer",
  "option": for mcq the answer options, for short_answer every acceptable answer, omitted for true_false,
  "answer": the correct option text for mcq, "True" or "False" for true_false, omitted for short_answer,
  "explanation": why the answer is correct and which topic needs to be revised,
  "difficulty": the difficulty label,
  "taxonomy_level": the cognitive level label.
Every question must be based on the main ideas or facts in the document."#;

fn quiz_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!("Content: {}\n\n", request.extracted_text);
    if !request.difficulty.is_empty() {
        prompt.push_str(&format!("Difficulty: {}\n", request.difficulty));
    }
    if !request.taxonomy.is_empty() {
        prompt.push_str(&format!("Taxonomy level: {}\n", request.taxonomy));
    }
    if !request.format.is_empty() {
        prompt.push_str(&format!("Question format: {}\n", request.format));
    }
    if !request.previous_questions.is_empty() {
        prompt.push_str("\nDo not repeat any of these questions:\n");
        for q in &request.previous_questions {
            prompt.push_str(&format!("- {}\n", q));
        }
    }
    prompt
}

fn chat_prompt(input: &str, context: &DocumentContext, history: &[ChatExchange]) -> String {
    let mut prompt = String::new();
    if context.has_content() {
        prompt.push_str(&format!("Document Content: {}\n\n", context.extracted_text));
    }

    let recent = &history[history.len().saturating_sub(CHAT_HISTORY_WINDOW)..];
    if !recent.is_empty() {
        prompt.push_str("Our recent conversation:\n");
        for exchange in recent {
            prompt.push_str(&format!("You: {}\n", exchange.user));
            prompt.push_str(&format!("Assistant: {}\n", exchange.assistant));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("User says: {}\n\n", input));
    prompt.push_str(
        "You are a helpful, friendly assistant having a natural conversation. \
         Reply in a warm, conversational tone, concisely (2-4 sentences at most).",
    );
    if context.has_content() {
        prompt.push_str(
            " If the question relates to the document content, base your answer on it; \
             otherwise answer generally.",
        );
    }
    prompt
}

fn completion_content(body: &JsonValue) -> Option<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
}
