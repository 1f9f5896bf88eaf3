//! Timestamp encoding for TEXT columns

use chrono::{DateTime, SecondsFormat, Utc};

use super::RepoError;

/// Fixed-width RFC 3339 so stored values sort chronologically as text
pub(crate) fn format_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts the stored RFC 3339 form and SQLite's `datetime()` form.
pub(crate) fn parse_db_timestamp(ts: &str) -> Result<DateTime<Utc>, RepoError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
    }
    Err(RepoError::InvalidData(format!("unreadable timestamp '{}'", ts)))
}
