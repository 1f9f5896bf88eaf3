//! Event repository

use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{
    CreateEventRequest, Event, FilterFacet, PaginationRequestOptions, PaginationResponse,
    UpdateEventRequest,
};

use super::{
    listing::{ListingTable, SearchSurface},
    timestamp::{format_db_timestamp, parse_db_timestamp},
    RepoError,
};

/// Columns offered as filter facets, in display order
pub const EVENT_FACET_COLUMNS: &[&str] = &["type", "application"];

const EVENTS: ListingTable = ListingTable {
    table: "events",
    columns: &[
        "id",
        "type",
        "name",
        "application",
        "message",
        "time",
        "organization_id",
    ],
    sortable: &["id", "type", "name", "application", "message", "time"],
    filterable: &["type", "name", "application"],
    search: SearchSurface::FullText {
        index: "events_fts",
    },
};

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    #[sqlx(rename = "type")]
    event_type: String,
    name: String,
    application: Option<String>,
    message: Option<String>,
    time: String,
    organization_id: i64,
}

pub struct EventRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        organization_id: i64,
        req: &CreateEventRequest,
    ) -> Result<Event, RepoError> {
        let time = req.time.unwrap_or_else(Utc::now);

        let result = sqlx::query(
            r#"
            INSERT INTO events (type, name, application, message, time, organization_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.event_type)
        .bind(&req.name)
        .bind(req.application.as_deref())
        .bind(req.message.as_deref())
        .bind(format_db_timestamp(time))
        .bind(organization_id)
        .execute(self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Event, RepoError> {
        let sql = format!("SELECT {} FROM events WHERE id = ?", EVENTS.select_list());
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepoError::NotFound).and_then(row_to_event)
    }

    /// Tenant-scoped lookup; an event of another organization is reported as missing.
    pub async fn get_by_id_and_organization(
        &self,
        id: i64,
        organization_id: i64,
    ) -> Result<Event, RepoError> {
        let sql = format!(
            "SELECT {} FROM events WHERE id = ? AND organization_id = ?",
            EVENTS.select_list()
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepoError::NotFound).and_then(row_to_event)
    }

    /// Update the mutable fields of a tenant's event; omitted fields keep their value.
    pub async fn update(
        &self,
        id: i64,
        organization_id: i64,
        req: &UpdateEventRequest,
    ) -> Result<Event, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET type = COALESCE(?, type),
                name = COALESCE(?, name),
                application = COALESCE(?, application),
                message = COALESCE(?, message)
            WHERE id = ? AND organization_id = ?
            "#,
        )
        .bind(req.event_type.as_deref())
        .bind(req.name.as_deref())
        .bind(req.application.as_deref())
        .bind(req.message.as_deref())
        .bind(id)
        .bind(organization_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::UpdateFailed);
        }

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64, organization_id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ? AND organization_id = ?")
            .bind(id)
            .bind(organization_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::DeleteFailed);
        }
        Ok(())
    }

    /// One page of a tenant's events with type and application facets.
    pub async fn all_for_organization(
        &self,
        organization_id: i64,
        options: &PaginationRequestOptions,
    ) -> Result<PaginationResponse<Vec<Event>>, RepoError> {
        let (rows, total) = EVENTS
            .fetch_page::<EventRow>(self.pool, organization_id, options)
            .await?;
        let events = rows
            .into_iter()
            .map(row_to_event)
            .collect::<Result<Vec<_>, _>>()?;

        let mut facets = Vec::with_capacity(EVENT_FACET_COLUMNS.len());
        for column in EVENT_FACET_COLUMNS {
            let values = self.distinct_values(column, organization_id).await?;
            facets.push(FilterFacet::new(*column, values, options));
        }

        Ok(PaginationResponse::new(events, options.clone(), total, facets))
    }

    pub async fn count(
        &self,
        organization_id: i64,
        options: &PaginationRequestOptions,
    ) -> Result<i64, RepoError> {
        EVENTS.count(self.pool, organization_id, options).await
    }

    pub async fn distinct_values(
        &self,
        column: &str,
        organization_id: i64,
    ) -> Result<Vec<String>, RepoError> {
        EVENTS
            .distinct_values(self.pool, column, organization_id)
            .await
    }
}

fn row_to_event(row: EventRow) -> Result<Event, RepoError> {
    Ok(Event {
        id: row.id,
        event_type: row.event_type,
        name: row.name,
        application: row.application,
        message: row.message,
        time: parse_db_timestamp(&row.time)?,
        organization_id: row.organization_id,
    })
}
