//! Data models

mod event;
mod organization;
mod pagination;
mod session;
mod user;

pub use event::*;
pub use organization::*;
pub use pagination::*;
pub use session::*;
pub use user::*;
