//! Middleware components
//!
//! This module contains middleware for:
//! - Authentication (API keys and session cookies)
//! - HTMX request detection
//! - Security headers

pub mod auth;
pub mod htmx;
pub mod security_headers;

pub use auth::{
    api_key_auth_middleware, session_auth_middleware, Credential, CurrentUser, Identity,
};
pub use htmx::{hx_redirect, HxHeaders};
pub use security_headers::{api_cache_control_middleware, security_headers_middleware};
