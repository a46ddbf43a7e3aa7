pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use reqwest::Client;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::middleware::rate_limit::{new_rps_state, rps_middleware};
use crate::services::{
    ai_service::{AIService, QuestionGenerator},
    assistant_service::{AssistantService, ChatResponder, Narrator, TracingNarrator},
    session_service::SessionService,
};

const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn QuestionGenerator>,
    pub session_service: SessionService,
    pub assistant_service: Arc<AssistantService>,
}

impl AppState {
    pub fn new() -> Result<Self> {
        Self::from_config(crate::config::get_config()?)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        let ai_service = Arc::new(AIService::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            http_client,
        ));

        Ok(Self::with_collaborators(
            ai_service.clone(),
            ai_service,
            Arc::new(TracingNarrator),
        ))
    }

    pub fn with_collaborators(
        generator: Arc<dyn QuestionGenerator>,
        responder: Arc<dyn ChatResponder>,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            session_service: SessionService::new(generator.clone()),
            assistant_service: Arc::new(AssistantService::new(responder, narrator)),
            generator,
        }
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let public_api = Router::new()
        .route("/get_session_data", get(routes::session::get_session_data))
        .route("/api/session", get(routes::session::get_session))
        .route("/api/session/load", post(routes::session::load_session))
        .route(
            "/api/session/answers/:index",
            put(routes::session::save_answer),
        )
        .route("/api/session/submit", post(routes::session::submit))
        .route(
            "/api/session/notice",
            delete(routes::session::dismiss_notice),
        )
        .route("/api/session/export", get(routes::export::export_quiz))
        .route("/avatar/context", get(routes::assistant::get_context))
        .route("/avatar/greeting", get(routes::assistant::greeting))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(config.public_rps),
            rps_middleware,
        ));

    let generation_api = Router::new()
        .route(
            "/api/session/regenerate",
            post(routes::session::regenerate),
        )
        .route("/generate_quiz", post(routes::generate::generate_quiz))
        .route("/avatar/chat", post(routes::assistant::chat))
        .layer(axum::middleware::from_fn_with_state(
            new_rps_state(config.generation_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(public_api)
        .merge(generation_api)
        .with_state(state)
        .layer(crate::middleware::cors::cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}
