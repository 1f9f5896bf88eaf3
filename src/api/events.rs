//! Event API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, info};

use crate::{
    db::EventRepository,
    middleware::Identity,
    models::{
        CreateEventRequest, Event, PaginationQuery, PaginationRequestOptions, PaginationResponse,
        UpdateEventRequest,
    },
    utils::{validation::{validate_event_fields, validate_event_time}, AppError},
    AppState,
};

use super::not_found_as;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/org/{org_id}/events",
            get(list_events).post(create_event),
        )
        .route(
            "/org/{org_id}/events/{event_id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

/// List a tenant's events.
///
/// Query parameters: `offset`, `limit`, `filter=<column>:<value>`,
/// `order_by=<column>[:asc|desc]` and `search=<text>`.
async fn list_events(
    State(state): State<AppState>,
    identity: Identity,
    Path(org_id): Path<i64>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginationResponse<Vec<Event>>>, AppError> {
    let org_id = identity.require_organization(org_id)?;
    let options = PaginationRequestOptions::from_query(&query)?;
    debug!(organization_id = org_id, "Listing events with {}", options);

    let page = EventRepository::new(&state.db)
        .all_for_organization(org_id, &options)
        .await?;

    Ok(Json(page))
}

async fn get_event(
    State(state): State<AppState>,
    identity: Identity,
    Path((org_id, event_id)): Path<(i64, i64)>,
) -> Result<Json<Event>, AppError> {
    let org_id = identity.require_organization(org_id)?;

    let event = EventRepository::new(&state.db)
        .get_by_id_and_organization(event_id, org_id)
        .await
        .map_err(not_found_as("event"))?;

    Ok(Json(event))
}

async fn create_event(
    State(state): State<AppState>,
    identity: Identity,
    Path(org_id): Path<i64>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let org_id = identity.require_organization(org_id)?;

    let mut outcome = validate_event_fields(
        Some(&payload.event_type),
        Some(&payload.name),
        payload.application.as_deref(),
    );
    validate_event_time(payload.time, &mut outcome);
    if !outcome.is_valid() {
        return Err(AppError::validation(outcome.errors));
    }

    let event = EventRepository::new(&state.db)
        .create(org_id, &payload)
        .await?;

    info!(
        organization_id = org_id,
        event_id = event.id,
        event_type = %event.event_type,
        "Event logged"
    );
    Ok((StatusCode::CREATED, Json(event)))
}

/// Update the type, name, application or message of an event.
async fn update_event(
    State(state): State<AppState>,
    identity: Identity,
    Path((org_id, event_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    let org_id = identity.require_organization(org_id)?;

    if payload.is_empty() {
        return Err(AppError::bad_request("no fields to update"));
    }
    let outcome = validate_event_fields(
        payload.event_type.as_deref(),
        payload.name.as_deref(),
        payload.application.as_deref(),
    );
    if !outcome.is_valid() {
        return Err(AppError::validation(outcome.errors));
    }

    let event = EventRepository::new(&state.db)
        .update(event_id, org_id, &payload)
        .await
        .map_err(not_found_as("event"))?;

    debug!(organization_id = org_id, event_id, "Event updated");
    Ok(Json(event))
}

async fn delete_event(
    State(state): State<AppState>,
    identity: Identity,
    Path((org_id, event_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    let org_id = identity.require_organization(org_id)?;

    EventRepository::new(&state.db)
        .delete(event_id, org_id)
        .await
        .map_err(not_found_as("event"))?;

    debug!(organization_id = org_id, event_id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}
