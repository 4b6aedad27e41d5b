use std::sync::Arc;

use crate::models::resume::Resume;
use crate::store::{
    CollectionPath, Direction, DocPath, DocumentStore, FieldUpdate, Precondition, Query,
    StoreResult,
};

use super::{decode, decode_all, encode, set_fields, ProfileRepository};

/// Fields a content update may touch. `is_public` is deliberately absent:
/// it belongs to the sharing flow, which does not bump `version`.
const REVISION_FIELDS: &[&str] = &[
    "title",
    "template_id",
    "content",
    "settings",
    "version",
    "version_history",
    "updated_at",
];

/// `users/{owner_id}/resumes/{resume_id}`
#[derive(Clone)]
pub struct ResumeRepository {
    store: Arc<dyn DocumentStore>,
}

impl ResumeRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(owner_id: &str) -> StoreResult<CollectionPath> {
        CollectionPath::under(&ProfileRepository::path(owner_id)?, "resumes")
    }

    fn path(owner_id: &str, resume_id: &str) -> StoreResult<DocPath> {
        Self::collection(owner_id)?.doc(resume_id)
    }

    pub async fn get(&self, owner_id: &str, resume_id: &str) -> StoreResult<Option<Resume>> {
        match self.store.get(&Self::path(owner_id, resume_id)?).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// All of the owner's resumes, most recently updated first.
    pub async fn list_recent_first(&self, owner_id: &str) -> StoreResult<Vec<Resume>> {
        let query = Query::new().order_by("updated_at", Direction::Descending);
        let docs = self
            .store
            .query(&Self::collection(owner_id)?, &query)
            .await?;
        decode_all(docs)
    }

    pub async fn create(&self, resume: &Resume) -> StoreResult<()> {
        self.store
            .create(&Self::path(&resume.owner_id, &resume.id)?, encode(resume)?)
            .await
    }

    /// Writes the content fields of `next` only if the stored version is
    /// still `read_version`.
    pub async fn replace_if_version(&self, next: &Resume, read_version: u32) -> StoreResult<()> {
        let updates = set_fields(next, REVISION_FIELDS)?;
        let guard = Precondition::field_equals("version", read_version);
        self.store
            .update(&Self::path(&next.owner_id, &next.id)?, &updates, Some(&guard))
            .await
    }

    pub async fn set_public(
        &self,
        owner_id: &str,
        resume_id: &str,
        is_public: bool,
    ) -> StoreResult<()> {
        self.store
            .update(
                &Self::path(owner_id, resume_id)?,
                &[FieldUpdate::set("is_public", is_public)],
                None,
            )
            .await
    }

    pub async fn delete(&self, owner_id: &str, resume_id: &str) -> StoreResult<bool> {
        self.store.delete(&Self::path(owner_id, resume_id)?).await
    }
}
