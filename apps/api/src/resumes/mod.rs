//! Owner-scoped resume CRUD with versioning and recency bookkeeping.
//!
//! Ordering of the multi-document writes:
//! - create: insert resume, then push recency. A caller-chosen id makes a
//!   retried create skip the insert and redo the recency step.
//! - update: version-guarded write, then recency (best effort, since the
//!   version bump has already committed and must not be replayed).
//! - delete: shared projection, then resume, then recency. Idempotent.

pub mod handlers;
pub mod versioning;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analytics::{new_event, RESUME_CREATED, RESUME_DELETED};
use crate::dal::{
    canonical_uuid, now, validate_id, validate_text, DataAccess, DataError, DataResult,
    MAX_CHANGE_NOTE_LEN, MAX_TITLE_LEN,
};
use crate::identity::AuthContext;
use crate::models::resume::{NewResume, Resume, ResumeContent, ResumePatch};
use crate::models::user::{RECENT_RESUMES_CAP, RECENT_TEMPLATES_CAP};
use crate::recency;
use crate::store::StoreError;

/// Attempts for an update without `expected_version` before giving up.
pub const RESUME_CAS_ATTEMPTS: u32 = 3;

impl DataAccess {
    pub async fn create_resume(&self, auth: &AuthContext, new: NewResume) -> DataResult<String> {
        let identity = auth.require()?;
        let title = validate_text("title", &new.title, MAX_TITLE_LEN)?;
        if let Some(template_id) = &new.template_id {
            validate_id("template", template_id)?;
        }
        let id = match &new.id {
            Some(id) => canonical_uuid("resume", id)?,
            None => Uuid::new_v4().to_string(),
        };

        // Resume creation can beat the sign-in bootstrap; make sure the owner
        // exists before writing under it.
        self.bootstrap_profile(identity).await?;

        let template_id = new.template_id.clone();
        let resume = versioning::initial_revision(
            id.clone(),
            &identity.id,
            NewResume { title, ..new },
            ResumeContent::for_identity(identity),
            now(),
        );
        match self.resumes.create(&resume).await {
            Ok(()) => {
                info!("Created resume {id} for user {}", identity.id);
                self.log_event(new_event(
                    RESUME_CREATED,
                    Some(&identity.id),
                    Some(&id),
                    json!({ "template_id": template_id }),
                ));
            }
            Err(StoreError::AlreadyExists(_)) => {
                info!("Resume {id} already exists for user {}; replaying recency", identity.id);
            }
            Err(e) => return Err(e.into()),
        }

        self.mutate_settings(&identity.id, |settings| {
            let resumes_changed =
                recency::touch(&mut settings.recent_resume_ids, &id, RECENT_RESUMES_CAP);
            let templates_changed = match &template_id {
                Some(t) => recency::touch(&mut settings.recent_template_ids, t, RECENT_TEMPLATES_CAP),
                None => false,
            };
            resumes_changed || templates_changed
        })
        .await?;

        Ok(id)
    }

    /// Most recently updated first. An owner with no resumes gets an empty list.
    pub async fn get_resumes(&self, auth: &AuthContext) -> DataResult<Vec<Resume>> {
        let identity = auth.require()?;
        let resumes = self.resumes.list_recent_first(&identity.id).await?;
        debug!("Loaded {} resumes for user {}", resumes.len(), identity.id);
        Ok(resumes)
    }

    /// Only ever looks inside the caller's own partition, so another user's
    /// resume id is indistinguishable from a missing one.
    pub async fn get_resume_by_id(&self, auth: &AuthContext, resume_id: &str) -> DataResult<Resume> {
        let identity = auth.require()?;
        validate_id("resume", resume_id)?;
        self.resumes
            .get(&identity.id, resume_id)
            .await?
            .ok_or_else(|| DataError::not_found("resume", resume_id))
    }

    pub async fn update_resume(
        &self,
        auth: &AuthContext,
        resume_id: &str,
        mut patch: ResumePatch,
    ) -> DataResult<Resume> {
        let identity = auth.require()?;
        validate_id("resume", resume_id)?;
        if patch.is_empty() {
            return Err(DataError::Validation("resume update has no fields".into()));
        }
        if let Some(title) = &patch.title {
            patch.title = Some(validate_text("title", title, MAX_TITLE_LEN)?);
        }
        if let Some(template_id) = patch.template_id.as_deref().filter(|t| !t.is_empty()) {
            validate_id("template", template_id)?;
        }
        patch.change_note = match patch.change_note.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(note) => Some(validate_text("change_note", note, MAX_CHANGE_NOTE_LEN)?),
        };

        for attempt in 1..=RESUME_CAS_ATTEMPTS {
            let current = self
                .resumes
                .get(&identity.id, resume_id)
                .await?
                .ok_or_else(|| DataError::not_found("resume", resume_id))?;
            if let Some(expected) = patch.expected_version {
                if expected != current.version {
                    return Err(version_conflict(resume_id, expected, current.version));
                }
            }

            let next = versioning::next_revision(&current, &patch, now());
            match self.resumes.replace_if_version(&next, current.version).await {
                Ok(()) => {
                    info!(
                        "Updated resume {resume_id} to version {} for user {}",
                        next.version, identity.id
                    );
                    self.refresh_resume_recency(&identity.id, resume_id).await;
                    return Ok(next);
                }
                Err(StoreError::PreconditionFailed { .. }) => {
                    if patch.expected_version.is_some() {
                        return Err(DataError::Conflict(format!(
                            "resume {resume_id} was modified concurrently"
                        )));
                    }
                    warn!("Concurrent update on resume {resume_id} (attempt {attempt}); retrying");
                }
                Err(StoreError::NotFound(_)) => {
                    return Err(DataError::not_found("resume", resume_id));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(DataError::Conflict(format!(
            "resume {resume_id} kept changing; gave up after {RESUME_CAS_ATTEMPTS} attempts"
        )))
    }

    /// Removes the resume, its public projection (if this owner shared it)
    /// and its recency entry. Deleting an absent resume still cleans up.
    pub async fn delete_resume(&self, auth: &AuthContext, resume_id: &str) -> DataResult<()> {
        let identity = auth.require()?;
        validate_id("resume", resume_id)?;

        // Projection first: if this step fails the private resume is intact
        // and the whole delete can simply be retried.
        if let Some(shared) = self.shared.get(resume_id).await? {
            if shared.owner_id == identity.id {
                self.shared.delete(resume_id).await?;
                info!("Removed public projection of resume {resume_id} before delete");
            }
        }

        let existed = self.resumes.delete(&identity.id, resume_id).await?;

        self.mutate_settings(&identity.id, |settings| {
            recency::remove(&mut settings.recent_resume_ids, resume_id)
        })
        .await?;

        if existed {
            info!("Deleted resume {resume_id} for user {}", identity.id);
            self.log_event(new_event(
                RESUME_DELETED,
                Some(&identity.id),
                Some(resume_id),
                serde_json::Value::Null,
            ));
        }
        Ok(())
    }

    async fn refresh_resume_recency(&self, user_id: &str, resume_id: &str) {
        let result = self
            .mutate_settings(user_id, |settings| {
                recency::touch(&mut settings.recent_resume_ids, resume_id, RECENT_RESUMES_CAP)
            })
            .await;
        if let Err(e) = result {
            warn!("Resume {resume_id} updated but recency refresh failed: {e}");
        }
    }
}

fn version_conflict(resume_id: &str, expected: u32, actual: u32) -> DataError {
    DataError::Conflict(format!(
        "resume {resume_id} is at version {actual}, update expected version {expected}"
    ))
}
