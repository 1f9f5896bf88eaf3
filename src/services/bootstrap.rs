//! First-run setup of the global organization and its administrator

use anyhow::{bail, Context, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    db::{OrganizationRepository, RepoError, UserRepository},
    models::{AdminStatus, NewUser, Organization, PasswordUpdate, User},
    utils::validation::{validate_password_update, validate_username},
};

use super::AuthService;

const GLOBAL_ORGANIZATION_NAME: &str = "Global";

/// What [`bootstrap`] found or created
#[derive(Debug)]
pub struct BootstrapOutcome {
    pub organization: Organization,
    /// True when the organization was created by this run, so its key is new
    pub organization_created: bool,
    /// The administrator created by this run, if any
    pub admin: Option<User>,
}

/// Ensure the global organization exists and optionally create a global admin.
///
/// Safe to run repeatedly: existing rows are left untouched.
pub async fn bootstrap(
    pool: &SqlitePool,
    config: &AppConfig,
    admin: Option<(&str, &str)>,
) -> Result<BootstrapOutcome> {
    let global_id = config.auth.global_organization_id;
    let organizations = OrganizationRepository::new(pool);

    let (organization, organization_created) = match organizations.get_by_id(global_id).await {
        Ok(organization) => (organization, false),
        Err(RepoError::NotFound) => {
            let organization = organizations
                .create_with_id(
                    global_id,
                    GLOBAL_ORGANIZATION_NAME,
                    &AuthService::generate_token(),
                )
                .await
                .context("Failed to create the global organization")?;
            info!(organization_id = global_id, "Created global organization");
            (organization, true)
        }
        Err(e) => return Err(e).context("Failed to look up the global organization"),
    };

    let admin = match admin {
        Some((username, password)) => create_admin(pool, config, global_id, username, password).await?,
        None => None,
    };

    Ok(BootstrapOutcome {
        organization,
        organization_created,
        admin,
    })
}

async fn create_admin(
    pool: &SqlitePool,
    config: &AppConfig,
    organization_id: i64,
    username: &str,
    password: &str,
) -> Result<Option<User>> {
    let users = UserRepository::new(pool);
    match users.get_by_username(username).await {
        Ok(_) => {
            warn!(username = %username, "Admin user already exists, leaving it unchanged");
            return Ok(None);
        }
        Err(RepoError::NotFound) => {}
        Err(e) => return Err(e).context("Failed to look up admin user"),
    }

    if !validate_username(username) {
        bail!("Invalid admin username: {}", username);
    }
    let outcome = validate_password_update(
        &PasswordUpdate {
            password: password.to_string(),
            confirm_password: password.to_string(),
        },
        &config.validation,
    );
    if let Some(message) = outcome.get("password") {
        bail!("Invalid admin password: {}", message);
    }

    let user = users
        .create(&NewUser {
            username: username.to_string(),
            password_hash: AuthService::hash_password(password)?,
            first_name: "Global".to_string(),
            last_name: "Admin".to_string(),
            email: String::new(),
            phone: String::new(),
            admin_status: AdminStatus::GlobalAdmin,
            organization_id,
        })
        .await
        .context("Failed to create admin user")?;

    info!(user_id = user.id, "Created global admin user");
    Ok(Some(user))
}
