//! Data-access layer: typed operations over the entity repositories.
//!
//! The operations themselves live next to their domain (`profile`,
//! `resumes`, `sharing`, `templates`, `analytics`) as `impl DataAccess`
//! blocks. This module holds the shared handle, the error taxonomy and input
//! validation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::analytics::AnalyticsSink;
use crate::repository::{
    ProfileRepository, ResumeRepository, SettingsRepository, SharedResumeRepository,
    TemplateRepository,
};
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Authentication required")]
    Unauthenticated,

    /// Also returned for entities owned by someone else.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Shared resume {0} has expired")]
    Expired(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl DataError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        DataError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for DataError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidPath(msg) => DataError::Validation(msg),
            other => DataError::Store(other),
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;

/// Shared handle to every data-access operation. Cheap to clone.
#[derive(Clone)]
pub struct DataAccess {
    pub(crate) profiles: ProfileRepository,
    pub(crate) settings: SettingsRepository,
    pub(crate) resumes: ResumeRepository,
    pub(crate) shared: SharedResumeRepository,
    pub(crate) templates: TemplateRepository,
    pub(crate) analytics: Arc<dyn AnalyticsSink>,
    public_base_url: String,
}

impl DataAccess {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        analytics: Arc<dyn AnalyticsSink>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            profiles: ProfileRepository::new(store.clone()),
            settings: SettingsRepository::new(store.clone()),
            resumes: ResumeRepository::new(store.clone()),
            shared: SharedResumeRepository::new(store.clone()),
            templates: TemplateRepository::new(store),
            analytics,
            public_base_url: public_base_url.into(),
        }
    }

    pub(crate) fn public_url(&self, resume_id: &str) -> String {
        format!("{}/shared/{}", self.public_base_url, resume_id)
    }
}

/// Current time at the millisecond precision documents are stored with, so
/// values handed back to callers compare equal to what a later read returns.
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

// ────────────────────────────────────────────────────────────────────────────
// Input validation
// ────────────────────────────────────────────────────────────────────────────

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CHANGE_NOTE_LEN: usize = 500;
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

/// Ids become path segments, so they must be non-empty and slash-free.
pub(crate) fn validate_id(kind: &str, id: &str) -> DataResult<()> {
    if id.is_empty() || id.contains('/') || id.trim() != id {
        return Err(DataError::Validation(format!("invalid {kind} id '{id}'")));
    }
    Ok(())
}

/// Client-chosen resume ids must be UUIDs; returns the canonical form.
pub(crate) fn canonical_uuid(kind: &str, id: &str) -> DataResult<String> {
    Uuid::parse_str(id)
        .map(|u| u.to_string())
        .map_err(|_| DataError::Validation(format!("{kind} id must be a UUID, got '{id}'")))
}

/// Trims and bounds a required text field.
pub(crate) fn validate_text(field: &str, value: &str, max_len: usize) -> DataResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DataError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(DataError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}
