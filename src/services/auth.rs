//! Authentication service
//!
//! Provides password hashing with Argon2, login with opaque session tokens,
//! session resolution with a sliding idle timeout, and logout.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use rand::{rngs::OsRng, RngCore};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    db::{RepoError, SessionRepository, UserRepository},
    models::{Session, User},
};

/// Number of random bytes in a session token or generated API key
const TOKEN_BYTES: usize = 32;

/// Verified against when the username is unknown so both login failures cost the same.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| AuthService::hash_password("laser-beam-timing-guard").unwrap_or_default());

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Authentication service for login sessions
pub struct AuthService {
    pool: SqlitePool,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(pool: SqlitePool, session_ttl: Duration) -> Self {
        Self { pool, session_ttl }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
        let parsed_hash =
            PasswordHash::new(password_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Random URL-safe token used for session keys and organization API keys
    pub fn generate_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Check credentials and open a new session.
    ///
    /// Unknown usernames and wrong passwords both yield [`AuthError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> Result<(Session, User), AuthError> {
        let user = match UserRepository::new(&self.pool)
            .get_by_username(username)
            .await
        {
            Ok(user) => Some(user),
            Err(RepoError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let hash = user
            .as_ref()
            .map(|u| u.password_hash.as_str())
            .unwrap_or(DUMMY_HASH.as_str());
        let verified = Self::verify_password(password, hash).unwrap_or(false);

        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!(username = %username, "Rejected login attempt");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let session = SessionRepository::new(&self.pool)
            .create(&Self::generate_token(), user.id)
            .await?;

        info!(user_id = user.id, organization_id = user.organization_id, "User logged in");
        Ok((session, user))
    }

    /// Resolve a session token to its user, refreshing the session's activity time.
    pub async fn resolve(&self, token: &str) -> Result<(Session, User), AuthError> {
        let sessions = SessionRepository::new(&self.pool);

        let session = match sessions.get_by_key(token).await {
            Ok(session) => session,
            Err(RepoError::NotFound) => return Err(AuthError::Unauthenticated),
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();
        if session.is_expired(self.session_ttl, now) {
            debug!(session_id = session.id, "Session expired");
            sessions.delete_by_key(token).await?;
            return Err(AuthError::Unauthenticated);
        }

        let user = match UserRepository::new(&self.pool).get_by_id(session.user_id).await {
            Ok(user) => user,
            Err(RepoError::NotFound) => return Err(AuthError::Unauthenticated),
            Err(e) => return Err(e.into()),
        };

        match sessions.touch(session.id, now).await {
            Ok(()) => {}
            Err(RepoError::UpdateFailed) => return Err(AuthError::Unauthenticated),
            Err(e) => return Err(e.into()),
        }

        Ok((
            Session {
                last_seen_time: now,
                ..session
            },
            user,
        ))
    }

    /// End a session. Returns `false` if it was already gone.
    pub async fn logout(&self, token: &str) -> Result<bool, AuthError> {
        let deleted = SessionRepository::new(&self.pool)
            .delete_by_key(token)
            .await?;
        if deleted {
            info!("User logged out");
        }
        Ok(deleted)
    }

    /// Store a new password for a user
    pub async fn change_password(&self, user_id: i64, new_password: &str) -> Result<(), AuthError> {
        let hash = Self::hash_password(new_password)?;
        UserRepository::new(&self.pool)
            .update_password(user_id, &hash)
            .await?;
        info!(user_id, "Password changed");
        Ok(())
    }

    /// Drop sessions that have been idle longer than the TTL
    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        let removed = SessionRepository::new(&self.pool)
            .delete_idle_since(Utc::now() - self.session_ttl)
            .await?;
        if removed > 0 {
            debug!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}
