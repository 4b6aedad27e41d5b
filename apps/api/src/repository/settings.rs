use std::sync::Arc;

use crate::models::user::UserSettings;
use crate::store::{CollectionPath, DocPath, DocumentStore, Precondition, StoreResult};

use super::{decode, encode, set_fields};

const MUTABLE_FIELDS: &[&str] = &[
    "preferences",
    "recent_resume_ids",
    "recent_template_ids",
    "revision",
    "updated_at",
];

/// `user_settings/{uid}`
#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<dyn DocumentStore>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn path(user_id: &str) -> StoreResult<DocPath> {
        CollectionPath::root("user_settings")?.doc(user_id)
    }

    pub async fn get(&self, user_id: &str) -> StoreResult<Option<UserSettings>> {
        match self.store.get(&Self::path(user_id)?).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, settings: &UserSettings) -> StoreResult<()> {
        self.store
            .create(&Self::path(&settings.user_id)?, encode(settings)?)
            .await
    }

    /// Writes `next` only if the stored revision is still `read_revision`.
    pub async fn replace_if_revision(
        &self,
        next: &UserSettings,
        read_revision: u64,
    ) -> StoreResult<()> {
        let updates = set_fields(next, MUTABLE_FIELDS)?;
        let guard = Precondition::field_equals("revision", read_revision);
        self.store
            .update(&Self::path(&next.user_id)?, &updates, Some(&guard))
            .await
    }
}
