//! Login and logout

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::warn;

use crate::{
    middleware::{hx_redirect, HxHeaders},
    services::AuthError,
    utils::AppError,
    AppState,
};

use super::html::{html_escape, respond, PageData};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn login_form(username: &str, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, html_escape(e)))
        .unwrap_or_default();
    format!(
        r##"<form id="login-form" method="post" action="/login" hx-post="/login" hx-target="#login-form" hx-swap="outerHTML">
    <h1>Sign in</h1>
    {}
    <label>Username <input name="username" value="{}" autocomplete="username" required></label>
    <label>Password <input name="password" type="password" autocomplete="current-password" required></label>
    <p><button type="submit">Log in</button></p>
</form>"##,
        error,
        html_escape(username)
    )
}

/// `GET /login`
pub async fn login_page(hx: HxHeaders) -> Response {
    respond(
        &hx,
        StatusCode::OK,
        "Login",
        &PageData::default(),
        &login_form("", None),
    )
}

/// `POST /login`
///
/// Unknown usernames and wrong passwords produce the same response.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    hx: HxHeaders,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let session = match state
        .auth_service()
        .login(&form.username, &form.password)
        .await
    {
        Ok((session, _)) => session,
        Err(AuthError::InvalidCredentials) => {
            return Ok(respond(
                &hx,
                StatusCode::UNAUTHORIZED,
                "Login",
                &PageData::default(),
                &login_form(&form.username, Some(INVALID_CREDENTIALS)),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let cookie = Cookie::build((state.config.auth.session_cookie_name.clone(), session.key))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.auth.cookie_secure);

    Ok((jar.add(cookie), hx_redirect(&hx, "/")).into_response())
}

/// `GET /logout`
///
/// Always ends at the login page, whether or not a session was open.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let cookie_name = state.config.auth.session_cookie_name.clone();

    let Some(token) = jar.get(&cookie_name).map(|c| c.value().to_string()) else {
        return Redirect::to("/login").into_response();
    };

    if let Err(e) = state.auth_service().logout(&token).await {
        warn!("Unable to delete session on logout: {}", e);
    }

    let jar = jar.remove(Cookie::build(cookie_name).path("/"));
    (jar, Redirect::to("/login")).into_response()
}
