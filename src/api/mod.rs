//! JSON API routes and handlers
//!
//! Tenant data lives under `/org/{org_id}`; every handler checks the caller's
//! [`Identity`](crate::middleware::Identity) against the requested organization
//! before touching the database.

use axum::{routing::get, Router};

use crate::{db::RepoError, utils::AppError, AppState};

pub mod account;
mod events;
mod health;
mod organizations;
mod users;

pub use health::*;

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::health_check_detailed))
}

/// API-key authenticated routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(organizations::routes())
        .merge(events::routes())
        .merge(users::routes())
}

/// Report a missing row as `"<what> not found"`, passing other errors through.
pub(crate) fn not_found_as(what: &'static str) -> impl FnOnce(RepoError) -> AppError {
    move |e| {
        if e.is_missing() {
            AppError::not_found(format!("{} not found", what))
        } else {
            e.into()
        }
    }
}
