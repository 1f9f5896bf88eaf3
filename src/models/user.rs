//! User model

use serde::{Deserialize, Serialize};

/// Administrative level of a user account.
///
/// Stored as an integer: 0 normal user, 1 organization admin, 2 global admin.
/// Global admin only grants cross-tenant access when the user belongs to the
/// configured global organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum AdminStatus {
    #[default]
    Normal,
    OrganizationAdmin,
    GlobalAdmin,
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Normal => "normal",
            AdminStatus::OrganizationAdmin => "organization_admin",
            AdminStatus::GlobalAdmin => "global_admin",
        }
    }
}

impl From<AdminStatus> for i64 {
    fn from(status: AdminStatus) -> Self {
        match status {
            AdminStatus::Normal => 0,
            AdminStatus::OrganizationAdmin => 1,
            AdminStatus::GlobalAdmin => 2,
        }
    }
}

impl TryFrom<i64> for AdminStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AdminStatus::Normal),
            1 => Ok(AdminStatus::OrganizationAdmin),
            2 => Ok(AdminStatus::GlobalAdmin),
            other => Err(format!("Invalid admin status: {}", other)),
        }
    }
}

impl std::fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub admin_status: AdminStatus,
    pub organization_id: i64,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Request to create a user within an organization
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub admin_status: AdminStatus,
}

/// Fully validated user ready for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub admin_status: AdminStatus,
    pub organization_id: i64,
}

/// Editable profile fields of the signed-in user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl From<&User> for ProfileUpdate {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordUpdate {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}
