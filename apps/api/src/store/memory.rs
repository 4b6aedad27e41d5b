use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{
    CollectionPath, Direction, DocPath, DocumentStore, FieldUpdate, Precondition, Query,
    StoreError, StoreResult,
};

type Collection = BTreeMap<String, Value>;

/// In-memory document store.
///
/// Intended for tests and single-process development. Every operation takes
/// the map lock once, so each single-document update (including its
/// precondition check) is atomic.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn require_object(path: &DocPath, data: &Value) -> StoreResult<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(path.as_string()))
    }
}

fn apply_updates(doc: &mut Map<String, Value>, updates: &[FieldUpdate]) {
    for update in updates {
        match update {
            FieldUpdate::Set { field, value } => {
                doc.insert(field.clone(), value.clone());
            }
            FieldUpdate::Increment { field, by } => {
                let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
                doc.insert(field.clone(), Value::from(current + by));
            }
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Orders JSON values the way the ordering queries need: nulls first, numbers
/// numerically, strings lexically. Arrays and objects compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(path.collection().as_str())
            .and_then(|c| c.get(path.id()))
            .cloned())
    }

    async fn create(&self, path: &DocPath, data: Value) -> StoreResult<()> {
        require_object(path, &data)?;
        let mut collections = self.collections.write().await;
        let collection = collections
            .entry(path.collection().as_str().to_string())
            .or_default();
        if collection.contains_key(path.id()) {
            return Err(StoreError::AlreadyExists(path.as_string()));
        }
        collection.insert(path.id().to_string(), data);
        Ok(())
    }

    async fn set(&self, path: &DocPath, data: Value) -> StoreResult<()> {
        require_object(path, &data)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(path.collection().as_str().to_string())
            .or_default()
            .insert(path.id().to_string(), data);
        Ok(())
    }

    async fn update(
        &self,
        path: &DocPath,
        updates: &[FieldUpdate],
        precondition: Option<&Precondition>,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(path.collection().as_str())
            .and_then(|c| c.get_mut(path.id()))
            .ok_or_else(|| StoreError::NotFound(path.as_string()))?;
        let doc = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument(path.as_string()))?;

        if let Some(pre) = precondition {
            if doc.get(&pre.field) != Some(&pre.value) {
                return Err(StoreError::PreconditionFailed {
                    path: path.as_string(),
                    field: pre.field.clone(),
                });
            }
        }

        apply_updates(doc, updates);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(path.collection().as_str())
            .and_then(|c| c.remove(path.id()))
            .is_some())
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection.as_str()) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<Value> = docs
            .values()
            .filter(|doc| {
                query
                    .filters
                    .iter()
                    .all(|f| doc.get(&f.field) == Some(&f.value))
            })
            .cloned()
            .collect();

        if let Some((field, direction)) = &query.order_by {
            results.sort_by(|a, b| {
                let a = a.get(field).unwrap_or(&Value::Null);
                let b = b.get(field).unwrap_or(&Value::Null);
                let ord = compare_values(a, b);
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        Ok(results)
    }
}
