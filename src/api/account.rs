//! Self-service account endpoints
//!
//! The JSON handlers here and the HTML forms in [`crate::web::account`] share
//! [`save_profile`] and [`save_password`], so both surfaces validate the same way.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::{
    db::UserRepository,
    middleware::CurrentUser,
    models::{PasswordUpdate, ProfileUpdate, User},
    utils::{
        validation::{validate_password_update, validate_profile_update, ValidationOutcome},
        AppError,
    },
    AppState,
};

/// Toast shown after a profile change
pub const PROFILE_UPDATED: &str = "Successfully updated user account!";
/// Toast shown after a password change
pub const PASSWORD_UPDATED: &str = "Successfully updated password!";

/// Result of an account change that passed or failed validation
#[derive(Debug)]
pub enum AccountChange<T> {
    Saved(T),
    Invalid(ValidationOutcome),
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Validate and store profile fields for `user_id`.
pub async fn save_profile(
    state: &AppState,
    user_id: i64,
    update: &ProfileUpdate,
) -> Result<AccountChange<User>, AppError> {
    let (normalized, outcome) = validate_profile_update(update, &state.config.validation);
    if !outcome.is_valid() {
        return Ok(AccountChange::Invalid(outcome));
    }

    let user = UserRepository::new(&state.db)
        .update_profile(user_id, &normalized)
        .await?;
    info!(user_id, "User account updated");

    Ok(AccountChange::Saved(user))
}

/// Validate and store a new password for `user_id`.
pub async fn save_password(
    state: &AppState,
    user_id: i64,
    update: &PasswordUpdate,
) -> Result<AccountChange<()>, AppError> {
    let outcome = validate_password_update(update, &state.config.validation);
    if !outcome.is_valid() {
        return Ok(AccountChange::Invalid(outcome));
    }

    state
        .auth_service()
        .change_password(user_id, &update.password)
        .await?;

    Ok(AccountChange::Saved(()))
}

/// `PUT /account`
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    match save_profile(&state, user.id, &update).await? {
        AccountChange::Saved(user) => Ok(Json(user)),
        AccountChange::Invalid(outcome) => Err(AppError::validation(outcome.errors)),
    }
}

/// `PUT /account/password`
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<PasswordUpdate>,
) -> Result<Json<MessageResponse>, AppError> {
    match save_password(&state, user.id, &update).await? {
        AccountChange::Saved(()) => Ok(Json(MessageResponse {
            message: PASSWORD_UPDATED.to_string(),
        })),
        AccountChange::Invalid(outcome) => Err(AppError::validation(outcome.errors)),
    }
}
