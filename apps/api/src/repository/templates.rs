use std::sync::Arc;

use crate::models::template::{Template, TemplateCatalog};
use crate::store::{CollectionPath, Direction, DocPath, DocumentStore, Query, StoreResult};

use super::{decode, decode_all, encode, set_fields};

const EDITABLE_FIELDS: &[&str] = &[
    "name",
    "description",
    "category",
    "is_premium",
    "popularity",
    "preview_url",
    "sections",
    "styling",
    "updated_at",
];

/// `templates/{id}` and `default_templates/{id}`
#[derive(Clone)]
pub struct TemplateRepository {
    store: Arc<dyn DocumentStore>,
}

impl TemplateRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn collection(catalog: TemplateCatalog) -> StoreResult<CollectionPath> {
        CollectionPath::root(catalog.collection_name())
    }

    fn path(catalog: TemplateCatalog, id: &str) -> StoreResult<DocPath> {
        Self::collection(catalog)?.doc(id)
    }

    /// Most popular first, optionally filtered by category and premium flag.
    pub async fn list(
        &self,
        catalog: TemplateCatalog,
        category: Option<&str>,
        is_premium: Option<bool>,
    ) -> StoreResult<Vec<Template>> {
        let mut query = Query::new();
        if let Some(category) = category {
            query = query.where_eq("category", category);
        }
        if let Some(is_premium) = is_premium {
            query = query.where_eq("is_premium", is_premium);
        }
        let query = query.order_by("popularity", Direction::Descending);
        decode_all(self.store.query(&Self::collection(catalog)?, &query).await?)
    }

    pub async fn get(&self, catalog: TemplateCatalog, id: &str) -> StoreResult<Option<Template>> {
        match self.store.get(&Self::path(catalog, id)?).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, catalog: TemplateCatalog, template: &Template) -> StoreResult<()> {
        self.store
            .create(&Self::path(catalog, &template.id)?, encode(template)?)
            .await
    }

    /// Overwrites the editable fields of an existing template.
    pub async fn replace(&self, catalog: TemplateCatalog, template: &Template) -> StoreResult<()> {
        let updates = set_fields(template, EDITABLE_FIELDS)?;
        self.store
            .update(&Self::path(catalog, &template.id)?, &updates, None)
            .await
    }

    pub async fn delete(&self, catalog: TemplateCatalog, id: &str) -> StoreResult<bool> {
        self.store.delete(&Self::path(catalog, id)?).await
    }
}
