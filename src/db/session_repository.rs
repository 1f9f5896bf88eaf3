//! Login session repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::Session;

use super::{
    timestamp::{format_db_timestamp, parse_db_timestamp},
    RepoError,
};

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    session_key: String,
    user_id: i64,
    login_time: String,
    last_seen_time: String,
}

pub struct SessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, key: &str, user_id: i64) -> Result<Session, RepoError> {
        let now = format_db_timestamp(Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO sessions (session_key, user_id, login_time, last_seen_time)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(key)
        .bind(user_id)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Session, RepoError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, session_key, user_id, login_time, last_seen_time
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepoError::NotFound).and_then(row_to_session)
    }

    pub async fn get_by_key(&self, key: &str) -> Result<Session, RepoError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, session_key, user_id, login_time, last_seen_time
            FROM sessions
            WHERE session_key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepoError::NotFound).and_then(row_to_session)
    }

    /// Record activity on a session
    pub async fn touch(&self, id: i64, seen_at: DateTime<Utc>) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE sessions SET last_seen_time = ? WHERE id = ?")
            .bind(format_db_timestamp(seen_at))
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::UpdateFailed);
        }
        Ok(())
    }

    /// Delete a session by key. Returns `false` when no session matched.
    pub async fn delete_by_key(&self, key: &str) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_key = ?")
            .bind(key)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove sessions idle since before `cutoff`
    pub async fn delete_idle_since(&self, cutoff: DateTime<Utc>) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM sessions WHERE last_seen_time < ?")
            .bind(format_db_timestamp(cutoff))
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn row_to_session(row: SessionRow) -> Result<Session, RepoError> {
    Ok(Session {
        id: row.id,
        key: row.session_key,
        user_id: row.user_id,
        login_time: parse_db_timestamp(&row.login_time)?,
        last_seen_time: parse_db_timestamp(&row.last_seen_time)?,
    })
}
