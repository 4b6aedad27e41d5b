//! Public sharing of resumes through the `shared_resumes` projection.
//!
//! The projection and the owner's `is_public` flag are two documents with no
//! transaction between them. The projection is written first when sharing
//! and deleted first when unsharing, so it is the source of truth:
//! `reconcile_sharing` realigns the flag (and drops projections whose
//! resume is gone) after any partial failure.

pub mod handlers;

use std::collections::HashSet;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::analytics::{new_event, RESUME_SHARED, RESUME_UNSHARED, SHARED_RESUME_VIEWED};
use crate::dal::{now, validate_id, DataAccess, DataError, DataResult};
use crate::identity::AuthContext;
use crate::models::resume::SharedResume;
use crate::store::StoreError;

pub const MAX_SHARE_DAYS: u32 = 365;

/// Attempts at clearing `is_public` once the projection is gone.
const UNSHARE_FLAG_ATTEMPTS: u32 = 3;
const UNSHARE_RETRY_BASE_MS: u64 = 50;

/// Repairs made by one [`DataAccess::reconcile_sharing`] sweep.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct ReconcileReport {
    /// Projections deleted because their source resume no longer exists.
    pub removed_projections: Vec<String>,
    /// Resumes whose `is_public` was raised to match an existing projection.
    pub flags_set: Vec<String>,
    /// Resumes whose `is_public` was cleared because no projection exists.
    pub flags_cleared: Vec<String>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.removed_projections.is_empty()
            && self.flags_set.is_empty()
            && self.flags_cleared.is_empty()
    }
}

impl DataAccess {
    /// Publishes a snapshot of the resume and returns its public URL.
    /// Sharing again refreshes the snapshot and restarts `view_count`.
    pub async fn share_resume(
        &self,
        auth: &AuthContext,
        resume_id: &str,
        expires_in_days: Option<u32>,
    ) -> DataResult<String> {
        let identity = auth.require()?;
        validate_id("resume", resume_id)?;
        if let Some(days) = expires_in_days {
            if !(1..=MAX_SHARE_DAYS).contains(&days) {
                return Err(DataError::Validation(format!(
                    "expires_in_days must be between 1 and {MAX_SHARE_DAYS}, got {days}"
                )));
            }
        }

        let resume = self
            .resumes
            .get(&identity.id, resume_id)
            .await?
            .ok_or_else(|| DataError::not_found("resume", resume_id))?;

        if let Some(existing) = self.shared.get(resume_id).await? {
            if existing.owner_id != identity.id {
                return Err(DataError::Conflict(format!(
                    "resume id {resume_id} is already shared by another user"
                )));
            }
        }

        let shared_at = now();
        let public_url = self.public_url(resume_id);
        let shared = SharedResume {
            resume_id: resume.id.clone(),
            owner_id: identity.id.clone(),
            title: resume.title.clone(),
            template_id: resume.template_id.clone(),
            content: resume.content.clone(),
            view_count: 0,
            public_url: public_url.clone(),
            shared_at,
            expires_at: expires_in_days.map(|days| shared_at + Duration::days(i64::from(days))),
        };
        self.shared.put(&shared).await?;

        match self.resumes.set_public(&identity.id, resume_id, true).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                // Deleted between the read and now; take the snapshot back down.
                warn!("Resume {resume_id} vanished while sharing; removing projection");
                self.shared.delete(resume_id).await?;
                return Err(DataError::not_found("resume", resume_id));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            "Shared resume {resume_id} for user {} (expires: {:?})",
            identity.id, shared.expires_at
        );
        self.log_event(new_event(
            RESUME_SHARED,
            Some(&identity.id),
            Some(resume_id),
            json!({ "expires_in_days": expires_in_days }),
        ));
        Ok(public_url)
    }

    /// Takes the public snapshot down. Safe to repeat.
    pub async fn unshare_resume(&self, auth: &AuthContext, resume_id: &str) -> DataResult<()> {
        let identity = auth.require()?;
        validate_id("resume", resume_id)?;

        let resume = self.resumes.get(&identity.id, resume_id).await?;
        let removed = match self.shared.get(resume_id).await? {
            Some(shared) if shared.owner_id == identity.id => {
                self.shared.delete(resume_id).await?
            }
            _ => false,
        };

        let Some(resume) = resume else {
            if removed {
                warn!("Removed projection of resume {resume_id} whose source is gone");
                return Ok(());
            }
            return Err(DataError::not_found("resume", resume_id));
        };

        if resume.is_public {
            self.clear_public_flag(&identity.id, resume_id).await?;
        }
        if removed || resume.is_public {
            info!("Unshared resume {resume_id} for user {}", identity.id);
            self.log_event(new_event(
                RESUME_UNSHARED,
                Some(&identity.id),
                Some(resume_id),
                serde_json::Value::Null,
            ));
        }
        Ok(())
    }

    /// Public read; no identity needed. Counts the view unless the share
    /// has expired.
    pub async fn get_shared_resume(&self, resume_id: &str) -> DataResult<SharedResume> {
        validate_id("resume", resume_id)?;
        let mut shared = self
            .shared
            .get(resume_id)
            .await?
            .ok_or_else(|| DataError::not_found("shared resume", resume_id))?;

        if shared.is_expired(now()) {
            debug!("Shared resume {resume_id} requested after expiry");
            return Err(DataError::Expired(resume_id.to_string()));
        }

        match self.shared.record_view(resume_id).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                return Err(DataError::not_found("shared resume", resume_id));
            }
            Err(e) => return Err(e.into()),
        }
        shared.view_count += 1;

        self.log_event(new_event(
            SHARED_RESUME_VIEWED,
            None,
            Some(resume_id),
            json!({ "owner_id": shared.owner_id }),
        ));
        Ok(shared)
    }

    /// Realigns the caller's `is_public` flags with the projections that
    /// actually exist and drops projections whose resume was deleted.
    pub async fn reconcile_sharing(&self, auth: &AuthContext) -> DataResult<ReconcileReport> {
        let identity = auth.require()?;
        let resumes = self.resumes.list_recent_first(&identity.id).await?;
        let projections = self.shared.list_by_owner(&identity.id).await?;

        let owned: HashSet<&str> = resumes.iter().map(|r| r.id.as_str()).collect();
        let mut report = ReconcileReport::default();
        let mut projected = HashSet::new();

        for projection in &projections {
            if owned.contains(projection.resume_id.as_str()) {
                projected.insert(projection.resume_id.as_str());
            } else {
                warn!(
                    "Removing orphaned projection {} for user {}",
                    projection.resume_id, identity.id
                );
                self.shared.delete(&projection.resume_id).await?;
                report.removed_projections.push(projection.resume_id.clone());
            }
        }

        for resume in &resumes {
            let should_be_public = projected.contains(resume.id.as_str());
            if resume.is_public == should_be_public {
                continue;
            }
            warn!(
                "Resume {} has is_public={} but projection exists={}; correcting",
                resume.id, resume.is_public, should_be_public
            );
            self.resumes
                .set_public(&identity.id, &resume.id, should_be_public)
                .await?;
            if should_be_public {
                report.flags_set.push(resume.id.clone());
            } else {
                report.flags_cleared.push(resume.id.clone());
            }
        }

        if report.is_clean() {
            debug!("Sharing state for user {} is consistent", identity.id);
        } else {
            info!("Reconciled sharing for user {}: {report:?}", identity.id);
        }
        Ok(report)
    }

    async fn clear_public_flag(&self, owner_id: &str, resume_id: &str) -> DataResult<()> {
        let mut attempt = 1;
        loop {
            match self.resumes.set_public(owner_id, resume_id, false).await {
                Ok(()) => return Ok(()),
                // Deleted concurrently; nothing left to clear.
                Err(StoreError::NotFound(_)) => return Ok(()),
                Err(e) if attempt < UNSHARE_FLAG_ATTEMPTS => {
                    warn!(
                        "Clearing is_public on resume {resume_id} failed (attempt {attempt}): {e}"
                    );
                    tokio::time::sleep(StdDuration::from_millis(
                        UNSHARE_RETRY_BASE_MS * u64::from(attempt),
                    ))
                    .await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::analytics::tests::FailingSink;
    use crate::identity::Identity;
    use crate::models::resume::{NewResume, ResumePatch};
    use crate::store::MemoryDocumentStore;

    fn dal() -> DataAccess {
        DataAccess::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(FailingSink),
            "https://cv.example.com",
        )
    }

    fn user(id: &str) -> AuthContext {
        AuthContext::authenticated(Identity {
            id: id.into(),
            email: None,
            display_name: Some(id.into()),
            photo_url: None,
        })
    }

    async fn resume_for(dal: &DataAccess, auth: &AuthContext) -> String {
        dal.create_resume(
            auth,
            NewResume {
                title: "Shared CV".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_share_with_seven_day_expiry() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;

        let before = Utc::now();
        let url = dal.share_resume(&alice, &id, Some(7)).await.unwrap();
        let after = Utc::now();
        assert_eq!(url, format!("https://cv.example.com/shared/{id}"));

        let resume = dal.get_resume_by_id(&alice, &id).await.unwrap();
        assert!(resume.is_public);

        let shared = dal.shared.get(&id).await.unwrap().unwrap();
        let expires_at = shared.expires_at.unwrap();
        let tolerance = Duration::seconds(1);
        assert!(expires_at >= before + Duration::days(7) - tolerance);
        assert!(expires_at <= after + Duration::days(7) + tolerance);
        assert_eq!(shared.view_count, 0);
        assert_eq!(shared.public_url, url);
    }

    #[tokio::test]
    async fn test_share_without_expiry_never_expires() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;
        dal.share_resume(&alice, &id, None).await.unwrap();
        let shared = dal.shared.get(&id).await.unwrap().unwrap();
        assert!(shared.expires_at.is_none());
        assert!(!shared.is_expired(Utc::now() + Duration::days(10_000)));
    }

    #[tokio::test]
    async fn test_share_rejects_bad_expiry_and_missing_resume() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;

        for days in [0, MAX_SHARE_DAYS + 1] {
            let err = dal.share_resume(&alice, &id, Some(days)).await.unwrap_err();
            assert!(matches!(err, DataError::Validation(_)));
        }
        let err = dal
            .share_resume(&alice, "no-such-resume", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));

        let err = dal.share_resume(&user("bob"), &id, None).await.unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_shared_read_counts_views() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;
        dal.share_resume(&alice, &id, Some(30)).await.unwrap();

        let first = dal.get_shared_resume(&id).await.unwrap();
        assert_eq!(first.view_count, 1);
        assert_eq!(first.title, "Shared CV");
        let second = dal.get_shared_resume(&id).await.unwrap();
        assert_eq!(second.view_count, 2);

        let stored = dal.shared.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.view_count, 2);
    }

    #[tokio::test]
    async fn test_expired_read_does_not_count() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;
        dal.share_resume(&alice, &id, Some(1)).await.unwrap();

        let mut shared = dal.shared.get(&id).await.unwrap().unwrap();
        shared.expires_at = Some(now() - Duration::minutes(1));
        shared.view_count = 4;
        dal.shared.put(&shared).await.unwrap();

        let err = dal.get_shared_resume(&id).await.unwrap_err();
        assert!(matches!(err, DataError::Expired(_)));
        let stored = dal.shared.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.view_count, 4);
    }

    #[tokio::test]
    async fn test_snapshot_ignores_later_edits_until_reshared() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;
        dal.share_resume(&alice, &id, None).await.unwrap();
        dal.get_shared_resume(&id).await.unwrap();

        dal.update_resume(
            &alice,
            &id,
            ResumePatch {
                title: Some("Edited".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(dal.get_shared_resume(&id).await.unwrap().title, "Shared CV");

        dal.share_resume(&alice, &id, None).await.unwrap();
        let reshared = dal.get_shared_resume(&id).await.unwrap();
        assert_eq!(reshared.title, "Edited");
        assert_eq!(reshared.view_count, 1);

        // Sharing does not count as a content revision.
        let resume = dal.get_resume_by_id(&alice, &id).await.unwrap();
        assert_eq!(resume.version, 2);
    }

    #[tokio::test]
    async fn test_unshare_then_read_is_not_found() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;
        dal.share_resume(&alice, &id, None).await.unwrap();

        dal.unshare_resume(&alice, &id).await.unwrap();
        let err = dal.get_shared_resume(&id).await.unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
        assert!(!dal.get_resume_by_id(&alice, &id).await.unwrap().is_public);

        // Repeating is harmless.
        dal.unshare_resume(&alice, &id).await.unwrap();
    }

    #[tokio::test]
    async fn test_unshare_by_other_user_leaves_share_alone() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;
        dal.share_resume(&alice, &id, None).await.unwrap();

        let err = dal.unshare_resume(&user("bob"), &id).await.unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
        assert!(dal.get_shared_resume(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_projection() {
        let dal = dal();
        let alice = user("alice");
        let id = resume_for(&dal, &alice).await;
        dal.share_resume(&alice, &id, None).await.unwrap();

        dal.delete_resume(&alice, &id).await.unwrap();
        let err = dal.get_shared_resume(&id).await.unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reconcile_repairs_partial_failures() {
        let dal = dal();
        let alice = user("alice");
        let orphan_source = resume_for(&dal, &alice).await;
        let flag_missing = resume_for(&dal, &alice).await;
        let flag_stale = resume_for(&dal, &alice).await;
        let healthy = resume_for(&dal, &alice).await;

        for id in [&orphan_source, &flag_missing, &flag_stale, &healthy] {
            dal.share_resume(&alice, id, None).await.unwrap();
        }
        // Resume removed behind the projection's back.
        dal.resumes.delete("alice", &orphan_source).await.unwrap();
        // Flag write lost after the projection was written.
        dal.resumes.set_public("alice", &flag_missing, false).await.unwrap();
        // Projection deleted but flag never cleared.
        dal.shared.delete(&flag_stale).await.unwrap();

        let report = dal.reconcile_sharing(&alice).await.unwrap();
        assert_eq!(report.removed_projections, vec![orphan_source.clone()]);
        assert_eq!(report.flags_set, vec![flag_missing.clone()]);
        assert_eq!(report.flags_cleared, vec![flag_stale.clone()]);

        assert!(dal.shared.get(&orphan_source).await.unwrap().is_none());
        assert!(dal.get_resume_by_id(&alice, &flag_missing).await.unwrap().is_public);
        assert!(!dal.get_resume_by_id(&alice, &flag_stale).await.unwrap().is_public);
        assert!(dal.get_resume_by_id(&alice, &healthy).await.unwrap().is_public);

        let again = dal.reconcile_sharing(&alice).await.unwrap();
        assert!(again.is_clean());
    }
}
