use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Append-only analytics record, stored at `analytics_events/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsEvent {
    pub id: String,
    pub event_type: String,
    pub user_id: Option<String>,
    pub resume_id: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}
