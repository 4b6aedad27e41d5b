//! Fire-and-forget analytics.
//!
//! Events are written on a detached task. A failing sink is logged at `warn`
//! and never reaches the operation that emitted the event.

pub mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::dal::DataAccess;
use crate::models::analytics::AnalyticsEvent;
use crate::store::{CollectionPath, DocumentStore, StoreResult};

pub const RESUME_CREATED: &str = "resume_created";
pub const RESUME_DELETED: &str = "resume_deleted";
pub const RESUME_SHARED: &str = "resume_shared";
pub const RESUME_UNSHARED: &str = "resume_unshared";
pub const SHARED_RESUME_VIEWED: &str = "shared_resume_viewed";

/// Default Redis stream key for [`RedisAnalyticsSink`].
pub const ANALYTICS_STREAM: &str = "analytics:events";

/// Destination for analytics events. Swap backends at startup.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record(&self, event: &AnalyticsEvent) -> StoreResult<()>;
}

/// Appends events to the `analytics_events` collection.
pub struct StoreAnalyticsSink {
    store: Arc<dyn DocumentStore>,
}

impl StoreAnalyticsSink {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnalyticsSink for StoreAnalyticsSink {
    async fn record(&self, event: &AnalyticsEvent) -> StoreResult<()> {
        let path = CollectionPath::root("analytics_events")?.doc(&event.id)?;
        self.store
            .create(&path, serde_json::to_value(event)?)
            .await
    }
}

/// Appends events to a Redis stream with `XADD`.
pub struct RedisAnalyticsSink {
    client: redis::Client,
    stream: String,
}

impl RedisAnalyticsSink {
    pub fn new(client: redis::Client, stream: impl Into<String>) -> Self {
        Self {
            client,
            stream: stream.into(),
        }
    }
}

#[async_trait]
impl AnalyticsSink for RedisAnalyticsSink {
    async fn record(&self, event: &AnalyticsEvent) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(event)?;
        let _entry_id: String = redis::cmd("XADD")
            .arg(&self.stream)
            .arg("*")
            .arg("event_type")
            .arg(&event.event_type)
            .arg("payload")
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

/// Builds an event with a fresh id and the current time.
pub fn new_event(
    event_type: &str,
    user_id: Option<&str>,
    resume_id: Option<&str>,
    metadata: Value,
) -> AnalyticsEvent {
    AnalyticsEvent {
        id: Uuid::new_v4().to_string(),
        event_type: event_type.to_string(),
        user_id: user_id.map(str::to_string),
        resume_id: resume_id.map(str::to_string),
        metadata,
        timestamp: Utc::now(),
    }
}

impl DataAccess {
    /// Records `event` in the background. Never fails and never blocks the
    /// caller on the sink.
    pub fn log_event(&self, event: AnalyticsEvent) {
        let sink = self.analytics.clone();
        tokio::spawn(async move {
            match sink.record(&event).await {
                Ok(()) => debug!("Recorded analytics event {}", event.event_type),
                Err(e) => warn!(
                    "Dropping analytics event {} ({}): {e}",
                    event.event_type, event.id
                ),
            }
        });
    }
}
