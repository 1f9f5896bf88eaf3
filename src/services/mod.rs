//! Business logic services

pub mod auth;
pub mod bootstrap;

pub use auth::{AuthError, AuthService};
pub use bootstrap::{bootstrap, BootstrapOutcome};
