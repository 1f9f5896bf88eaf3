//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged event belonging to a single organization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub name: String,
    pub application: Option<String>,
    pub message: Option<String>,
    pub time: DateTime<Utc>,
    pub organization_id: i64,
}

impl Event {
    /// Time formatted for display in the events table
    pub fn formatted_time(&self) -> String {
        self.time.format("%Y/%m/%d %H:%M:%S").to_string()
    }
}

/// Request body for logging a new event
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    #[serde(rename = "type")]
    pub event_type: String,
    pub name: String,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Defaults to the time of insertion.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Partial update of the mutable event fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UpdateEventRequest {
    pub fn is_empty(&self) -> bool {
        self.event_type.is_none()
            && self.name.is_none()
            && self.application.is_none()
            && self.message.is_none()
    }
}
