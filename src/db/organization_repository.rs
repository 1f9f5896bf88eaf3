//! Organization (tenant) repository

use sqlx::SqlitePool;

use crate::models::{Organization, UpdateOrganizationRequest};

use super::RepoError;

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: i64,
    name: String,
    secret_key: String,
}

pub struct OrganizationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrganizationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Organization>, RepoError> {
        let rows = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, secret_key
            FROM organizations
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_org).collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Organization, RepoError> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, secret_key
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(row_to_org).ok_or(RepoError::NotFound)
    }

    /// Look up the organization owning an API key
    pub async fn get_by_key(&self, secret_key: &str) -> Result<Organization, RepoError> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, secret_key
            FROM organizations
            WHERE secret_key = ?
            "#,
        )
        .bind(secret_key)
        .fetch_optional(self.pool)
        .await?;

        row.map(row_to_org).ok_or(RepoError::NotFound)
    }

    pub async fn create(&self, name: &str, secret_key: &str) -> Result<Organization, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO organizations (name, secret_key)
            VALUES (?, ?)
            "#,
        )
        .bind(name)
        .bind(secret_key)
        .execute(self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    /// Create an organization with a fixed id, used to set up the global organization.
    pub async fn create_with_id(
        &self,
        id: i64,
        name: &str,
        secret_key: &str,
    ) -> Result<Organization, RepoError> {
        sqlx::query("INSERT INTO organizations (id, name, secret_key) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(secret_key)
            .execute(self.pool)
            .await?;

        self.get_by_id(id).await
    }

    pub async fn update(
        &self,
        id: i64,
        req: &UpdateOrganizationRequest,
    ) -> Result<Organization, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET name = COALESCE(?, name), secret_key = COALESCE(?, secret_key)
            WHERE id = ?
            "#,
        )
        .bind(req.name.as_deref())
        .bind(req.secret_key.as_deref())
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::UpdateFailed);
        }

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::DeleteFailed);
        }
        Ok(())
    }
}

fn row_to_org(row: OrganizationRow) -> Organization {
    Organization {
        id: row.id,
        name: row.name,
        secret_key: row.secret_key,
    }
}
