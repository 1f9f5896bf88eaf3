//! Authentication middleware and request identity
//!
//! The JSON API authenticates with an organization API key (`X-API-Key` header or
//! `key` query parameter). The web UI authenticates with a session cookie. Both
//! layers insert an [`Identity`] into the request extensions, which handlers
//! extract and use to authorize access to a tenant.

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::{
    db::{OrganizationRepository, RepoError, UserRepository},
    models::{AdminStatus, Organization, User},
    services::{AuthError, AuthService},
    utils::AppError,
    AppState,
};

use super::htmx::{hx_redirect, HxHeaders};

/// Header carrying an organization API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// How the caller authenticated
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    ApiKey,
    Session(User),
}

/// Resolved identity of the caller, set once by the authentication middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Tenant the credential maps to
    pub organization_id: i64,
    /// Whether the credential may access every tenant
    pub global: bool,
    pub credential: Credential,
}

impl Identity {
    pub fn for_api_key(organization: &Organization, global_organization_id: i64) -> Self {
        Self {
            organization_id: organization.id,
            global: organization.id == global_organization_id,
            credential: Credential::ApiKey,
        }
    }

    /// Users are global only as global admins of the global organization.
    pub fn for_user(user: User, global_organization_id: i64) -> Self {
        Self {
            organization_id: user.organization_id,
            global: user.organization_id == global_organization_id
                && user.admin_status == AdminStatus::GlobalAdmin,
            credential: Credential::Session(user),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match &self.credential {
            Credential::Session(user) => Some(user),
            Credential::ApiKey => None,
        }
    }

    /// True if the caller may access data of `organization_id`
    pub fn authorize(&self, organization_id: i64) -> bool {
        self.global || self.organization_id == organization_id
    }

    /// Tenant guard: wrong tenant is `401`, never `404`.
    pub fn require_organization(&self, organization_id: i64) -> Result<i64, AppError> {
        if self.authorize(organization_id) {
            Ok(organization_id)
        } else {
            warn!(
                authorized_org_id = self.organization_id,
                requested_org_id = organization_id,
                "Rejected cross-tenant request"
            );
            Err(AppError::unauthorized("not authorized for requested org_id"))
        }
    }

    /// Guard for cross-tenant operations
    pub fn require_global(&self) -> Result<(), AppError> {
        if self.global {
            Ok(())
        } else {
            Err(AppError::unauthorized("global authorization required"))
        }
    }
}

/// Extractor for Identity from request extensions
///
/// This allows using Identity as a handler parameter after auth middleware has run.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// The signed-in user of a session-authenticated request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        match identity.credential {
            Credential::Session(user) => Ok(CurrentUser(user)),
            Credential::ApiKey => Err(AppError::unauthorized("a user session is required")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiKeyQuery {
    key: Option<String>,
}

/// API key from the header, falling back to the `key` query parameter
fn extract_api_key(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    from_header
        .or_else(|| {
            Query::<ApiKeyQuery>::try_from_uri(request.uri())
                .ok()
                .and_then(|Query(q)| q.key)
        })
        .filter(|key| !key.is_empty())
}

/// API key authentication middleware
pub async fn api_key_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = extract_api_key(&request).ok_or_else(|| AppError::unauthorized("no api key supplied"))?;

    let organization = match OrganizationRepository::new(&state.db).get_by_key(&key).await {
        Ok(organization) => organization,
        Err(RepoError::NotFound) => {
            warn!("Rejected request with unknown API key");
            return Err(AppError::unauthorized("invalid api key"));
        }
        Err(e) => return Err(e.into()),
    };

    let identity = Identity::for_api_key(&organization, state.config.auth.global_organization_id);
    debug!(
        organization_id = identity.organization_id,
        global = identity.global,
        "API key authenticated"
    );
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Session cookie authentication middleware
///
/// Requests without a valid session are redirected to the login page.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    hx: HxHeaders,
    mut request: Request,
    next: Next,
) -> Response {
    let global_organization_id = state.config.auth.global_organization_id;

    let user = if let Some(username) = state.config.auth.auto_login_user.as_deref() {
        match UserRepository::new(&state.db).get_by_username(username).await {
            Ok(user) => user,
            Err(e) => {
                error!("Auto-login user '{}' could not be loaded: {}", username, e);
                return AppError::internal(format!(
                    "Error on auto-login, user '{}' not found",
                    username
                ))
                .into_response();
            }
        }
    } else {
        let Some(token) = jar
            .get(&state.config.auth.session_cookie_name)
            .map(|c| c.value().to_string())
        else {
            return hx_redirect(&hx, "/login");
        };

        let auth = AuthService::new(state.db.clone(), state.config.auth.session_ttl());
        match auth.resolve(&token).await {
            Ok((_, user)) => user,
            Err(AuthError::Unauthenticated) => return hx_redirect(&hx, "/login"),
            Err(e) => return AppError::from(e).into_response(),
        }
    };

    request
        .extensions_mut()
        .insert(Identity::for_user(user, global_organization_id));

    next.run(request).await
}
