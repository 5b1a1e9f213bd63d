use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Document, DocumentId, DocumentQuery, FieldFilter, Result, SortDirection, SortKey, StoreError,
    store::{DocumentStore, NumericSummary},
};

const SELECT_DOCUMENT: &str = "SELECT id, collection, created_at, body FROM documents";

/// PostgreSQL-backed document store implementation.
///
/// Every collection lives in the single `documents` table with the body kept
/// as JSONB. Filters compile to JSONB operators with all values bound.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url` and wraps it.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            id: DocumentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            collection: row.try_get("collection")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            body: row.try_get("body")?,
        })
    }
}

/// Appends `AND <predicate>` for every filter.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &[FieldFilter]) {
    for filter in filters {
        builder.push(" AND ");
        match filter {
            FieldFilter::Equals { field, value } => {
                builder
                    .push("body -> ")
                    .push_bind(field.clone())
                    .push("::text = ")
                    .push_bind(value.clone())
                    .push("::jsonb");
            }
            FieldFilter::ContainsAny { field, values } => {
                builder
                    .push("body -> ")
                    .push_bind(field.clone())
                    .push("::text ?| ")
                    .push_bind(values.clone())
                    .push("::text[]");
            }
            FieldFilter::Range { field, min, max } => {
                builder.push("TRUE");
                if let Some(min) = min {
                    builder
                        .push(" AND (body ->> ")
                        .push_bind(field.clone())
                        .push("::text)::bigint >= ")
                        .push_bind(*min);
                }
                if let Some(max) = max {
                    builder
                        .push(" AND (body ->> ")
                        .push_bind(field.clone())
                        .push("::text)::bigint <= ")
                        .push_bind(*max);
                }
            }
            FieldFilter::TextMatch { fields, needle } => {
                let pattern = format!("%{}%", escape_like(needle));
                builder.push("(FALSE");
                for field in fields {
                    builder
                        .push(" OR body ->> ")
                        .push_bind(field.clone())
                        .push("::text ILIKE ")
                        .push_bind(pattern.clone());
                }
                builder.push(")");
            }
        }
    }
}

/// Escapes LIKE metacharacters so the needle is matched literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Postgres takes LIMIT and OFFSET as bigint; larger windows clamp to its maximum.
fn sql_window(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn where_collection<'a>(sql: &str, collection: &str) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(sql);
    builder
        .push(" WHERE collection = ")
        .push_bind(collection.to_string());
    builder
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, document: Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, created_at, body)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&document.collection)
        .bind(document.id.as_uuid())
        .bind(document.created_at)
        .bind(&document.body)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::DuplicateId {
                    collection: document.collection.clone(),
                    id: document.id,
                };
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn replace(&self, document: Document) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET created_at = $3, body = $4
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(&document.collection)
        .bind(document.id.as_uuid())
        .bind(document.created_at)
        .bind(&document.body)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, collection, created_at, body
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn delete(&self, collection: &str, id: DocumentId) -> Result<Option<Document>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = $2
            RETURNING id, collection, created_at, body
            "#,
        )
        .bind(collection)
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn find(&self, query: DocumentQuery) -> Result<Vec<Document>> {
        let mut builder = where_collection(SELECT_DOCUMENT, &query.collection);
        push_filters(&mut builder, &query.filters);

        let direction = match query.sort.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        match &query.sort.key {
            SortKey::CreatedAt => {
                builder.push(format!(" ORDER BY created_at {direction}, id ASC"));
            }
            SortKey::Number(field) => {
                builder
                    .push(" ORDER BY (body ->> ")
                    .push_bind(field.clone())
                    .push(format!("::text)::double precision {direction}, id ASC"));
            }
        }

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(sql_window(limit));
        }
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ").push_bind(sql_window(offset));
        }

        tracing::debug!(sql = builder.sql(), "document query");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn count(&self, collection: &str, filters: &[FieldFilter]) -> Result<u64> {
        let mut builder = where_collection("SELECT COUNT(*) FROM documents", collection);
        push_filters(&mut builder, filters);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn summarize(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        field: &str,
    ) -> Result<NumericSummary> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) AS count, AVG((body ->> ");
        builder
            .push_bind(field.to_string())
            .push("::text)::double precision) AS mean FROM documents WHERE collection = ")
            .push_bind(collection.to_string());
        push_filters(&mut builder, filters);

        let row = builder.build().fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        let mean: Option<f64> = row.try_get("mean")?;

        Ok(NumericSummary {
            count: count as u64,
            mean,
        })
    }
}
