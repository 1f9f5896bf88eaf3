//! Server-rendered web UI
//!
//! Pages are plain HTML enhanced with htmx. Every route except login and
//! logout sits behind the session cookie middleware.

use axum::{response::Redirect, routing::get, Router};

use crate::{api, db::OrganizationRepository, models::User, utils::AppError, AppState};

pub mod account;
pub mod events;
pub mod html;
pub mod session;

pub use html::{html_escape, PageData};

/// Routes reachable without a session
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(session::login_page).post(session::login))
        .route("/logout", get(session::logout))
}

/// Session-authenticated routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/events") }))
        .route("/events", get(events::events_page))
        .route(
            "/account",
            get(account::account_page)
                .post(account::update_account)
                .put(api::account::update_profile),
        )
        .route("/account/edit", get(account::edit_account_page))
        .route(
            "/account/password",
            get(account::password_page)
                .post(account::update_password)
                .put(api::account::update_password),
        )
}

/// Page data for `user`, with their organization loaded
pub(crate) async fn page_for(
    state: &AppState,
    user: User,
    route: &'static str,
) -> Result<PageData, AppError> {
    let organization = OrganizationRepository::new(&state.db)
        .get_by_id(user.organization_id)
        .await?;
    Ok(PageData::new(user, organization, route))
}
