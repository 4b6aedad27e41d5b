use std::sync::Arc;

use crate::models::resume::SharedResume;
use crate::store::{
    CollectionPath, Direction, DocPath, DocumentStore, FieldUpdate, Query, StoreResult,
};

use super::{decode, decode_all, encode};

/// `shared_resumes/{resume_id}`
#[derive(Clone)]
pub struct SharedResumeRepository {
    store: Arc<dyn DocumentStore>,
}

impl SharedResumeRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection() -> StoreResult<CollectionPath> {
        CollectionPath::root("shared_resumes")
    }

    fn path(resume_id: &str) -> StoreResult<DocPath> {
        Self::collection()?.doc(resume_id)
    }

    pub async fn get(&self, resume_id: &str) -> StoreResult<Option<SharedResume>> {
        match self.store.get(&Self::path(resume_id)?).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// The owner's projections, oldest share first.
    pub async fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<SharedResume>> {
        let query = Query::new()
            .where_eq("owner_id", owner_id)
            .order_by("shared_at", Direction::Ascending);
        decode_all(self.store.query(&Self::collection()?, &query).await?)
    }

    /// Writes (or overwrites) the snapshot.
    pub async fn put(&self, shared: &SharedResume) -> StoreResult<()> {
        self.store
            .set(&Self::path(&shared.resume_id)?, encode(shared)?)
            .await
    }

    /// Atomically bumps `view_count` by one.
    pub async fn record_view(&self, resume_id: &str) -> StoreResult<()> {
        self.store
            .update(
                &Self::path(resume_id)?,
                &[FieldUpdate::increment("view_count", 1)],
                None,
            )
            .await
    }

    pub async fn delete(&self, resume_id: &str) -> StoreResult<bool> {
        self.store.delete(&Self::path(resume_id)?).await
    }
}
