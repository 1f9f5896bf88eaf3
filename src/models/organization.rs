//! Organization (tenant) model

use serde::{Deserialize, Serialize};

/// A tenant. Every user and event belongs to exactly one organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    /// API key identifying the tenant; never echoed back outside of creation.
    #[serde(skip_serializing)]
    pub secret_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    /// Generated when omitted.
    #[serde(default)]
    pub secret_key: Option<String>,
}

/// Returned once on creation so the caller can record the key.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrganizationResponse {
    #[serde(flatten)]
    pub organization: Organization,
    pub secret_key: String,
}

impl From<Organization> for CreateOrganizationResponse {
    fn from(organization: Organization) -> Self {
        let secret_key = organization.secret_key.clone();
        Self {
            organization,
            secret_key,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub secret_key: Option<String>,
}
