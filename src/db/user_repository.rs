//! User repository

use sqlx::SqlitePool;

use crate::models::{
    AdminStatus, NewUser, PaginationRequestOptions, PaginationResponse, ProfileUpdate, User,
};

use super::{
    listing::{ListingTable, SearchSurface},
    RepoError,
};

const USERS: ListingTable = ListingTable {
    table: "users",
    columns: &[
        "id",
        "username",
        "password_hash",
        "first_name",
        "last_name",
        "email",
        "phone",
        "admin_status",
        "organization_id",
    ],
    sortable: &[
        "id",
        "username",
        "first_name",
        "last_name",
        "email",
        "admin_status",
    ],
    filterable: &["admin_status"],
    search: SearchSurface::Prefix {
        columns: &["username", "first_name", "last_name", "email"],
    },
};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    admin_status: i64,
    organization_id: i64,
}

pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &NewUser) -> Result<User, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, email, phone, admin_status, organization_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(i64::from(user.admin_status))
        .bind(user.organization_id)
        .execute(self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid()).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, RepoError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USERS.select_list());
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(row_to_user).ok_or(RepoError::NotFound)
    }

    /// Tenant-scoped lookup; a user of another organization is reported as missing.
    pub async fn get_by_id_and_organization(
        &self,
        id: i64,
        organization_id: i64,
    ) -> Result<User, RepoError> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = ? AND organization_id = ?",
            USERS.select_list()
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(self.pool)
            .await?;

        row.map(row_to_user).ok_or(RepoError::NotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, RepoError> {
        let sql = format!(
            "SELECT {} FROM users WHERE username = ?",
            USERS.select_list()
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        row.map(row_to_user).ok_or(RepoError::NotFound)
    }

    pub async fn all_for_organization(
        &self,
        organization_id: i64,
        options: &PaginationRequestOptions,
    ) -> Result<PaginationResponse<Vec<User>>, RepoError> {
        let (rows, total) = USERS
            .fetch_page::<UserRow>(self.pool, organization_id, options)
            .await?;
        let users = rows.into_iter().map(row_to_user).collect();

        Ok(PaginationResponse::new(users, options.clone(), total, vec![]))
    }

    pub async fn update_profile(&self, id: i64, profile: &ProfileUpdate) -> Result<User, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, email = ?, phone = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::UpdateFailed);
        }

        self.get_by_id(id).await
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::UpdateFailed);
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::DeleteFailed);
        }
        Ok(())
    }
}

fn row_to_user(row: UserRow) -> User {
    User {
        id: row.id,
        username: row.username,
        password_hash: row.password_hash,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        // guarded by a CHECK constraint
        admin_status: AdminStatus::try_from(row.admin_status).unwrap_or_default(),
        organization_id: row.organization_id,
    }
}
