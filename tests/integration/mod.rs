//! Integration tests for Laser Beam
//!
//! These tests drive the full router, middleware included, against a
//! temporary SQLite database.

mod api_tests;
mod session_tests;
mod tenant_isolation_tests;
