//! Database migrations
//!
//! Migrations are handled by SQLx and stored in the `migrations/` directory.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Tables the application cannot run without
pub const REQUIRED_TABLES: &[&str] = &["organizations", "users", "sessions", "events", "events_fts"];

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}

/// Names of required tables that are absent from the schema
pub async fn missing_tables(pool: &SqlitePool) -> Result<Vec<&'static str>> {
    let mut missing = Vec::new();
    for table in REQUIRED_TABLES {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(*table)
                .fetch_optional(pool)
                .await
                .with_context(|| format!("Failed to inspect table {}", table))?;
        if exists.is_none() {
            missing.push(*table);
        }
    }
    Ok(missing)
}

/// Apply migrations, verify the schema and rebuild the search index
pub async fn fix_database(pool: &SqlitePool) -> Result<()> {
    run_migrations(pool).await?;

    let missing = missing_tables(pool).await?;
    if !missing.is_empty() {
        warn!(tables = ?missing, "Database is missing required tables");
        anyhow::bail!("Missing required tables: {}", missing.join(", "));
    }

    sqlx::query("INSERT INTO events_fts (events_fts) VALUES ('rebuild')")
        .execute(pool)
        .await
        .context("Failed to rebuild event search index")?;

    info!("Database schema verified and search index rebuilt");
    Ok(())
}
