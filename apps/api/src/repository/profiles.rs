use std::sync::Arc;

use crate::models::user::UserProfile;
use crate::store::{CollectionPath, DocPath, DocumentStore, FieldUpdate, StoreResult};

use super::{decode, encode};

/// `users/{uid}`
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub(super) fn path(user_id: &str) -> StoreResult<DocPath> {
        CollectionPath::root("users")?.doc(user_id)
    }

    pub async fn get(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        match self.store.get(&Self::path(user_id)?).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Fails with `AlreadyExists` if the profile was created concurrently.
    pub async fn create(&self, profile: &UserProfile) -> StoreResult<()> {
        self.store
            .create(&Self::path(&profile.id)?, encode(profile)?)
            .await
    }

    pub async fn update(&self, user_id: &str, updates: &[FieldUpdate]) -> StoreResult<()> {
        self.store.update(&Self::path(user_id)?, updates, None).await
    }
}
