//! Build script for laser-beam
//!
//! Migrations are embedded with `sqlx::migrate!`, so changes to them must
//! trigger a rebuild.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
