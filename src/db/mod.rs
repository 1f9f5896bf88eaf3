//! Database layer
//!
//! SQLite storage for organizations, users, login sessions and events. All
//! tenant-scoped queries take the organization id as a mandatory predicate.

mod error;
mod event_repository;
mod listing;
pub mod migrations;
mod organization_repository;
mod session_repository;
mod timestamp;
mod user_repository;

pub use error::RepoError;
pub use event_repository::{EventRepository, EVENT_FACET_COLUMNS};
pub use organization_repository::OrganizationRepository;
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;

use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::config::DatabaseConfig;

/// Database connection pool type
pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool and apply pending migrations
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let timeout = Duration::from_secs(config.connect_timeout_secs);

    let options = SqliteConnectOptions::from_str(&config.url)
        .with_context(|| format!("Invalid database URL: {}", config.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Round-trip a trivial query to confirm the database answers
pub async fn check_health(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Database health check failed")?;
    Ok(())
}
