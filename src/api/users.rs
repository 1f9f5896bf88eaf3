//! User API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::{
    db::{RepoError, UserRepository},
    middleware::Identity,
    models::{
        AdminStatus, CreateUserRequest, NewUser, PaginationQuery, PaginationRequestOptions,
        PaginationResponse, PasswordUpdate, ProfileUpdate, User,
    },
    services::AuthService,
    utils::{
        validation::{validate_password_update, validate_profile_update, validate_username},
        AppError,
    },
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/org/{org_id}/users", get(list_users).post(create_user))
}

async fn list_users(
    State(state): State<AppState>,
    identity: Identity,
    Path(org_id): Path<i64>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginationResponse<Vec<User>>>, AppError> {
    let org_id = identity.require_organization(org_id)?;
    let options = PaginationRequestOptions::from_query(&query)?;

    let page = UserRepository::new(&state.db)
        .all_for_organization(org_id, &options)
        .await?;

    Ok(Json(page))
}

async fn create_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(org_id): Path<i64>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let org_id = identity.require_organization(org_id)?;

    if payload.admin_status == AdminStatus::GlobalAdmin && !identity.global {
        return Err(AppError::forbidden(
            "only global credentials may create global admins",
        ));
    }

    let rules = &state.config.validation;
    let (profile, mut outcome) = validate_profile_update(
        &ProfileUpdate {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            phone: payload.phone,
        },
        rules,
    );
    if !validate_username(&payload.username) {
        outcome.add(
            "username",
            "Username must start with a letter and contain only letters, digits, '.', '_' or '-'",
        );
    }
    let password_outcome = validate_password_update(
        &PasswordUpdate {
            password: payload.password.clone(),
            confirm_password: payload.password.clone(),
        },
        rules,
    );
    for (field, message) in password_outcome.errors {
        outcome.add(&field, message);
    }
    if !outcome.is_valid() {
        return Err(AppError::validation(outcome.errors));
    }

    let new_user = NewUser {
        username: payload.username,
        password_hash: AuthService::hash_password(&payload.password)?,
        first_name: profile.first_name,
        last_name: profile.last_name,
        email: profile.email,
        phone: profile.phone,
        admin_status: payload.admin_status,
        organization_id: org_id,
    };

    let user = UserRepository::new(&state.db)
        .create(&new_user)
        .await
        .map_err(|e| match e {
            RepoError::DuplicateKey => AppError::conflict("username already exists"),
            RepoError::ForeignKeyViolation => AppError::conflict("organization does not exist"),
            other => other.into(),
        })?;

    info!(
        user_id = user.id,
        organization_id = org_id,
        admin_status = %user.admin_status,
        "User created"
    );
    Ok((StatusCode::CREATED, Json(user)))
}
