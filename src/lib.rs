//! Laser Beam Library
//!
//! Multi-tenant event logging: organizations log events through a JSON API
//! authenticated by API key, and their users browse them in a session-based web UI.

use std::time::Duration;

use axum::{
    http::{HeaderValue, Method},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;
pub mod web;

pub use config::AppConfig;
pub use db::DbPool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub db: DbPool,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        Self { config, db }
    }

    /// Authentication service bound to this state's pool and session TTL
    pub fn auth_service(&self) -> services::AuthService {
        services::AuthService::new(self.db.clone(), self.config.auth.session_ttl())
    }
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Public routes must stay outside the authentication layers, otherwise the
    // login page itself would redirect to login.
    let api_router = api::routes()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::api_key_auth_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::api_cache_control_middleware,
        ));

    let web_router = web::routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::session_auth_middleware,
    ));

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(api::public_routes())
        .merge(web::public_routes())
        .merge(api_router)
        .merge(web_router)
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors)
}

/// CORS is only opened for explicitly configured origins.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(middleware::auth::API_KEY_HEADER),
        ])
}
