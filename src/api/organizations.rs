//! Organization (tenant) API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::{
    db::{OrganizationRepository, RepoError},
    middleware::Identity,
    models::{
        CreateOrganizationRequest, CreateOrganizationResponse, Organization,
        UpdateOrganizationRequest,
    },
    services::AuthService,
    utils::{validation::ValidationOutcome, AppError},
    AppState,
};

use super::not_found_as;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/org", get(list_organizations).post(create_organization))
        .route(
            "/org/{org_id}",
            get(get_organization)
                .put(update_organization)
                .delete(delete_organization),
        )
}

fn validate_name(name: Option<&str>, outcome: &mut ValidationOutcome) {
    if name.is_some_and(|n| n.trim().is_empty()) {
        outcome.add("name", "Organization name must not be empty");
    }
}

fn validate_secret_key(secret_key: Option<&str>, outcome: &mut ValidationOutcome) {
    if secret_key.is_some_and(|k| k.trim().is_empty()) {
        outcome.add("secret_key", "Secret key must not be empty");
    }
}

async fn list_organizations(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Organization>>, AppError> {
    identity.require_global()?;

    let organizations = OrganizationRepository::new(&state.db).list().await?;
    Ok(Json(organizations))
}

async fn get_organization(
    State(state): State<AppState>,
    identity: Identity,
    Path(org_id): Path<i64>,
) -> Result<Json<Organization>, AppError> {
    let org_id = identity.require_organization(org_id)?;

    let organization = OrganizationRepository::new(&state.db)
        .get_by_id(org_id)
        .await
        .map_err(not_found_as("organization"))?;

    Ok(Json(organization))
}

/// Create a tenant. The API key is generated unless one is supplied, and is
/// returned only in this response.
async fn create_organization(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<CreateOrganizationResponse>), AppError> {
    identity.require_global()?;

    let mut outcome = ValidationOutcome::default();
    validate_name(Some(&payload.name), &mut outcome);
    validate_secret_key(payload.secret_key.as_deref(), &mut outcome);
    if !outcome.is_valid() {
        return Err(AppError::validation(outcome.errors));
    }

    let secret_key = payload
        .secret_key
        .unwrap_or_else(AuthService::generate_token);

    let organization = OrganizationRepository::new(&state.db)
        .create(payload.name.trim(), &secret_key)
        .await
        .map_err(|e| match e {
            RepoError::DuplicateKey => {
                AppError::conflict("organization name or key already exists")
            }
            other => other.into(),
        })?;

    info!(organization_id = organization.id, "Organization created");
    Ok((StatusCode::CREATED, Json(organization.into())))
}

async fn update_organization(
    State(state): State<AppState>,
    identity: Identity,
    Path(org_id): Path<i64>,
    Json(payload): Json<UpdateOrganizationRequest>,
) -> Result<Json<Organization>, AppError> {
    identity.require_global()?;

    let mut outcome = ValidationOutcome::default();
    validate_name(payload.name.as_deref(), &mut outcome);
    validate_secret_key(payload.secret_key.as_deref(), &mut outcome);
    if !outcome.is_valid() {
        return Err(AppError::validation(outcome.errors));
    }

    let organization = OrganizationRepository::new(&state.db)
        .update(org_id, &payload)
        .await
        .map_err(not_found_as("organization"))?;

    info!(organization_id = organization.id, "Organization updated");
    Ok(Json(organization))
}

/// Delete a tenant together with its users, sessions and events.
async fn delete_organization(
    State(state): State<AppState>,
    identity: Identity,
    Path(org_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    identity.require_global()?;

    if org_id == state.config.auth.global_organization_id {
        return Err(AppError::bad_request(
            "the global organization cannot be deleted",
        ));
    }

    OrganizationRepository::new(&state.db)
        .delete(org_id)
        .await
        .map_err(not_found_as("organization"))?;

    info!(organization_id = org_id, "Organization deleted");
    Ok(StatusCode::NO_CONTENT)
}
