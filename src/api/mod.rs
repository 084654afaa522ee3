//! API layer - HTTP handlers and routing
//!
//! This module contains the HTTP endpoints of the knowledge base:
//! - Article API endpoints
//! - Tag API endpoints
//! - Media API endpoints

pub mod articles;
pub mod media;
pub mod middleware;
pub mod tags;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;

pub use middleware::{ApiError, AppState};

/// Build the main API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/articles", articles::router())
        .nest("/media", media::router())
        .nest("/tags", tags::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);
    let cors = match server.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(
                "Invalid CORS origin {:?}, cross-origin requests will be rejected",
                server.cors_origin
            );
            cors
        }
    };

    Router::new()
        .nest("/api/v1", build_api_router())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
