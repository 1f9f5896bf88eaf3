//! Account pages: profile display, profile form and password form

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::Response,
};

use crate::{
    api::account::{save_password, save_profile, AccountChange, PASSWORD_UPDATED, PROFILE_UPDATED},
    middleware::{CurrentUser, HxHeaders},
    models::{PasswordUpdate, ProfileUpdate},
    utils::AppError,
    AppState,
};

use super::{
    html::{html_escape, respond, PageData},
    page_for,
};

fn account_view(page: &PageData) -> String {
    let Some(user) = &page.user else {
        return String::new();
    };
    let organization = page
        .organization
        .as_ref()
        .map(|o| html_escape(&o.name))
        .unwrap_or_default();

    format!(
        r##"<section id="account">
    <h1>{}</h1>
    <table>
        <tr><th>Username</th><td>{}</td></tr>
        <tr><th>Organization</th><td>{}</td></tr>
        <tr><th>Email</th><td>{}</td></tr>
        <tr><th>Phone</th><td>{}</td></tr>
        <tr><th>Role</th><td>{}</td></tr>
    </table>
    <p>
        <a href="/account/edit" hx-get="/account/edit" hx-target="#account" hx-swap="outerHTML" hx-push-url="true">Edit account</a>
        <a href="/account/password" hx-get="/account/password" hx-target="#account" hx-swap="outerHTML" hx-push-url="true">Change password</a>
    </p>
</section>"##,
        html_escape(&user.full_name()),
        html_escape(&user.username),
        organization,
        html_escape(&user.email),
        html_escape(&user.phone),
        user.admin_status,
    )
}

fn input(page: &PageData, name: &str, label: &str, value: &str, kind: &str) -> String {
    format!(
        r#"<label>{} <input name="{}" type="{}" value="{}"></label>{}"#,
        label,
        name,
        kind,
        html_escape(value),
        page.field_error(name)
    )
}

fn profile_form(page: &PageData, values: &ProfileUpdate) -> String {
    format!(
        r##"<section id="account">
    <h1>Edit account</h1>
    <form method="post" action="/account" hx-post="/account" hx-target="#account" hx-swap="outerHTML">
        {}
        {}
        {}
        {}
        <p><button type="submit">Save</button> <a href="/account">Cancel</a></p>
    </form>
</section>"##,
        input(page, "first_name", "First name", &values.first_name, "text"),
        input(page, "last_name", "Last name", &values.last_name, "text"),
        input(page, "email", "Email", &values.email, "email"),
        input(page, "phone", "Phone", &values.phone, "tel"),
    )
}

fn password_form(page: &PageData) -> String {
    format!(
        r##"<section id="account">
    <h1>Change password</h1>
    <form method="post" action="/account/password" hx-post="/account/password" hx-target="#account" hx-swap="outerHTML">
        {}
        {}
        <p><button type="submit">Update password</button> <a href="/account">Cancel</a></p>
    </form>
</section>"##,
        input(page, "password", "New password", "", "password"),
        input(page, "confirm_password", "Confirm password", "", "password"),
    )
}

/// `GET /account`
pub async fn account_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxHeaders,
) -> Result<Response, AppError> {
    let page = page_for(&state, user, "/account").await?;
    Ok(respond(&hx, StatusCode::OK, "Account", &page, &account_view(&page)))
}

/// `GET /account/edit`
pub async fn edit_account_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxHeaders,
) -> Result<Response, AppError> {
    let values = ProfileUpdate::from(&user);
    let page = page_for(&state, user, "/account/edit").await?;
    Ok(respond(
        &hx,
        StatusCode::OK,
        "Edit account",
        &page,
        &profile_form(&page, &values),
    ))
}

/// `POST /account`
///
/// Invalid input re-renders the form with the submitted values and a message
/// next to each offending field.
pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxHeaders,
    Form(update): Form<ProfileUpdate>,
) -> Result<Response, AppError> {
    match save_profile(&state, user.id, &update).await? {
        AccountChange::Saved(updated) => {
            let mut page = page_for(&state, updated, "/account").await?;
            page.add_toast(PROFILE_UPDATED);
            Ok(respond(&hx, StatusCode::OK, "Account", &page, &account_view(&page)))
        }
        AccountChange::Invalid(outcome) => {
            let mut page = page_for(&state, user, "/account/edit").await?;
            page.errors = outcome.errors;
            Ok(respond(
                &hx,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Edit account",
                &page,
                &profile_form(&page, &update),
            ))
        }
    }
}

/// `GET /account/password`
pub async fn password_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxHeaders,
) -> Result<Response, AppError> {
    let page = page_for(&state, user, "/account/password").await?;
    Ok(respond(
        &hx,
        StatusCode::OK,
        "Change password",
        &page,
        &password_form(&page),
    ))
}

/// `POST /account/password`
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxHeaders,
    Form(update): Form<PasswordUpdate>,
) -> Result<Response, AppError> {
    match save_password(&state, user.id, &update).await? {
        AccountChange::Saved(()) => {
            let mut page = page_for(&state, user, "/account").await?;
            page.add_toast(PASSWORD_UPDATED);
            Ok(respond(&hx, StatusCode::OK, "Account", &page, &account_view(&page)))
        }
        AccountChange::Invalid(outcome) => {
            let mut page = page_for(&state, user, "/account/password").await?;
            page.errors = outcome.errors;
            Ok(respond(
                &hx,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Change password",
                &page,
                &password_form(&page),
            ))
        }
    }
}
