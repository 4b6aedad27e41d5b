use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{
    CollectionPath, Direction, DocPath, DocumentStore, FieldUpdate, Precondition, Query,
    StoreError, StoreResult,
};

/// PostgreSQL-backed document store.
///
/// All documents live in one `documents` table keyed by full path, with the
/// collection path stored alongside for queries. Field names are always bound
/// as parameters, never interpolated into SQL.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, path: &DocPath) -> StoreResult<bool> {
        let found: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM documents WHERE path = $1")
            .bind(path.as_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

fn require_object(path: &DocPath, data: &Value) -> StoreResult<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(path.as_string()))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT data FROM documents WHERE path = $1")
            .bind(path.as_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(data,)| data))
    }

    async fn create(&self, path: &DocPath, data: Value) -> StoreResult<()> {
        require_object(path, &data)?;
        let result = sqlx::query(
            r#"
            INSERT INTO documents (path, collection, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (path) DO NOTHING
            "#,
        )
        .bind(path.as_string())
        .bind(path.collection().as_str())
        .bind(data)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(path.as_string()));
        }
        Ok(())
    }

    async fn set(&self, path: &DocPath, data: Value) -> StoreResult<()> {
        require_object(path, &data)?;
        sqlx::query(
            r#"
            INSERT INTO documents (path, collection, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (path) DO UPDATE SET data = EXCLUDED.data, updated_at = now()
            "#,
        )
        .bind(path.as_string())
        .bind(path.collection().as_str())
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        path: &DocPath,
        updates: &[FieldUpdate],
        precondition: Option<&Precondition>,
    ) -> StoreResult<()> {
        let mut sets = Map::new();
        let mut increments = Vec::new();
        for update in updates {
            match update {
                FieldUpdate::Set { field, value } => {
                    sets.insert(field.clone(), value.clone());
                }
                FieldUpdate::Increment { field, by } => increments.push((field.clone(), *by)),
            }
        }

        // data = jsonb_set(jsonb_set((data || $sets), ...), ...)
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE documents SET updated_at = now(), data = ");
        for _ in &increments {
            qb.push("jsonb_set(");
        }
        qb.push("(data || ");
        qb.push_bind(Value::Object(sets));
        qb.push("::jsonb)");
        for (field, by) in increments {
            qb.push(", ARRAY[");
            qb.push_bind(field.clone());
            qb.push("::text], to_jsonb(COALESCE((data ->> ");
            qb.push_bind(field);
            qb.push("::text)::bigint, 0) + ");
            qb.push_bind(by);
            qb.push("::bigint))");
        }
        qb.push(" WHERE path = ");
        qb.push_bind(path.as_string());
        if let Some(pre) = precondition {
            qb.push(" AND data -> ");
            qb.push_bind(pre.field.clone());
            qb.push("::text = ");
            qb.push_bind(pre.value.clone());
            qb.push("::jsonb");
        }

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing matched: distinguish a missing document from a failed guard.
        match precondition {
            Some(pre) if self.exists(path).await? => Err(StoreError::PreconditionFailed {
                path: path.as_string(),
                field: pre.field.clone(),
            }),
            _ => Err(StoreError::NotFound(path.as_string())),
        }
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE path = $1")
            .bind(path.as_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Value>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT data FROM documents WHERE collection = ");
        qb.push_bind(collection.as_str().to_string());

        for filter in &query.filters {
            qb.push(" AND data -> ");
            qb.push_bind(filter.field.clone());
            qb.push("::text = ");
            qb.push_bind(filter.value.clone());
            qb.push("::jsonb");
        }

        if let Some((field, direction)) = &query.order_by {
            qb.push(" ORDER BY data -> ");
            qb.push_bind(field.clone());
            qb.push(match direction {
                Direction::Ascending => "::text ASC NULLS FIRST",
                Direction::Descending => "::text DESC NULLS LAST",
            });
        }

        let rows: Vec<(Value,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!("Query on {collection} returned {} documents", rows.len());
        Ok(rows.into_iter().map(|(data,)| data).collect())
    }
}
