//! Common test utilities and helpers
//!
//! Seeded fixtures and an in-process client for the full router.

pub mod test_app;

pub use fixtures::*;
pub use test_app::*;
