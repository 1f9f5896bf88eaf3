//! Login session model

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Server-side record backing a session cookie
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub id: i64,
    #[serde(skip_serializing)]
    pub key: String,
    pub user_id: i64,
    pub login_time: DateTime<Utc>,
    pub last_seen_time: DateTime<Utc>,
}

impl Session {
    /// Sessions expire after `ttl` of inactivity.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_seen_time > ttl
    }
}
