use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;

/// CORS for the quiz front end. Without a configured origin every origin
/// is allowed.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    match config
        .cors_allowed_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}
