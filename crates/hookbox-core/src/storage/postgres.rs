//! Durable record store backed by PostgreSQL.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres, QueryBuilder, Row,
};
use tracing::debug;

use super::{BoxFuture, RecordStore};
use crate::{
    error::Result,
    models::{ListFilter, NewRecord, Page, RecordId, WebhookRecord},
};

/// Postgres-backed append-only store.
///
/// Timestamps are assigned under a short-lived mutex that is never held
/// across an await point, keeping `created_at` strictly increasing per
/// store instance the same way the memory backend does.
pub struct PostgresStore {
    pool: Arc<PgPool>,
    last_created_at: Mutex<Option<DateTime<Utc>>>,
}

const SELECT_COLUMNS: &str = "id, method, pathname, source_ip, status_code, content_type, \
     content_length, query_params, headers, body, created_at";

impl PostgresStore {
    /// Connects to the database and bootstraps the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(StdDuration::from_secs(10))
            .connect(database_url)
            .await?;

        let store = Self { pool: Arc::new(pool), last_created_at: Mutex::new(None) };
        store.bootstrap().await?;
        Ok(store)
    }

    /// Wraps an existing pool. Callers own schema bootstrap.
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool), last_created_at: Mutex::new(None) }
    }

    /// Creates the records table and its paging index if absent.
    pub async fn bootstrap(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS webhook_records (
                id UUID PRIMARY KEY,
                method TEXT NOT NULL,
                pathname TEXT NOT NULL,
                source_ip TEXT NOT NULL,
                status_code INTEGER NOT NULL,
                content_type TEXT,
                content_length BIGINT NOT NULL,
                query_params JSONB,
                headers JSONB NOT NULL,
                body BYTEA NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&*self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_webhook_records_page
            ON webhook_records (created_at DESC, id DESC)
            "#,
        )
        .execute(&*self.pool)
        .await?;

        debug!("webhook_records schema ready");
        Ok(())
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut guard = self.last_created_at.lock().unwrap_or_else(|e| e.into_inner());
        let mut now = Utc::now();
        if let Some(last) = *guard {
            if now <= last {
                now = last + Duration::nanoseconds(1);
            }
        }
        *guard = Some(now);
        now
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for WebhookRecord {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let status_code: i32 = row.try_get("status_code")?;
        let content_length: i64 = row.try_get("content_length")?;
        let headers: sqlx::types::Json<HashMap<String, String>> = row.try_get("headers")?;
        let query_params: Option<sqlx::types::Json<HashMap<String, String>>> =
            row.try_get("query_params")?;
        let body: Vec<u8> = row.try_get("body")?;

        Ok(Self {
            id: RecordId(row.try_get("id")?),
            method: row.try_get("method")?,
            pathname: row.try_get("pathname")?,
            source_ip: row.try_get("source_ip")?,
            status_code: u16::try_from(status_code)
                .map_err(|_| sqlx::Error::Decode("status_code out of range".into()))?,
            content_type: row.try_get("content_type")?,
            content_length: u64::try_from(content_length)
                .map_err(|_| sqlx::Error::Decode("content_length out of range".into()))?,
            query_params: query_params.map(|q| q.0),
            headers: headers.0,
            body: Bytes::from(body),
            created_at: row.try_get("created_at")?,
        })
    }
}

impl RecordStore for PostgresStore {
    fn insert(&self, record: NewRecord) -> BoxFuture<'_, Result<WebhookRecord>> {
        Box::pin(async move {
            let record = record.into_record(RecordId::new(), self.next_timestamp());

            sqlx::query(
                r#"
                INSERT INTO webhook_records
                    (id, method, pathname, source_ip, status_code, content_type,
                     content_length, query_params, headers, body, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(record.id.0)
            .bind(&record.method)
            .bind(&record.pathname)
            .bind(&record.source_ip)
            .bind(i32::from(record.status_code))
            .bind(&record.content_type)
            .bind(record.content_length as i64)
            .bind(record.query_params.as_ref().map(|q| sqlx::types::Json(q.clone())))
            .bind(sqlx::types::Json(record.headers.clone()))
            .bind(record.body.as_ref())
            .bind(record.created_at)
            .execute(&*self.pool)
            .await?;

            Ok(record)
        })
    }

    fn list(&self, filter: ListFilter) -> BoxFuture<'_, Result<Page>> {
        Box::pin(async move {
            filter.validate()?;

            let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "SELECT {SELECT_COLUMNS} FROM webhook_records WHERE TRUE"
            ));
            if let Some(method) = &filter.method {
                query.push(" AND method = ").push_bind(method);
            }
            if let Some(pathname) = &filter.pathname {
                query.push(" AND pathname = ").push_bind(pathname);
            }
            if let Some(prefix) = &filter.pathname_prefix {
                query.push(" AND starts_with(pathname, ").push_bind(prefix).push(")");
            }
            if let Some(min) = filter.status_min {
                query.push(" AND status_code >= ").push_bind(i32::from(min));
            }
            if let Some(max) = filter.status_max {
                query.push(" AND status_code <= ").push_bind(i32::from(max));
            }
            if let Some(after) = filter.created_after {
                query.push(" AND created_at > ").push_bind(after);
            }
            if let Some(before) = filter.created_before {
                query.push(" AND created_at < ").push_bind(before);
            }
            if let Some(cursor) = &filter.cursor {
                query
                    .push(" AND (created_at, id) < (")
                    .push_bind(cursor.created_at)
                    .push(", ")
                    .push_bind(cursor.id.0)
                    .push(")");
            }
            // Over-fetch one row to learn whether another page exists.
            query
                .push(" ORDER BY created_at DESC, id DESC LIMIT ")
                .push_bind(filter.limit as i64 + 1);

            let mut records: Vec<WebhookRecord> =
                query.build_query_as().fetch_all(&*self.pool).await?;

            let next_cursor = if records.len() > filter.limit {
                records.truncate(filter.limit);
                records.last().map(WebhookRecord::cursor)
            } else {
                None
            };

            Ok(Page { records, next_cursor })
        })
    }

    fn find_by_id(&self, id: RecordId) -> BoxFuture<'_, Result<Option<WebhookRecord>>> {
        Box::pin(async move {
            let record = sqlx::query_as(&format!(
                "SELECT {SELECT_COLUMNS} FROM webhook_records WHERE id = $1"
            ))
            .bind(id.0)
            .fetch_optional(&*self.pool)
            .await?;
            Ok(record)
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_records")
                .fetch_one(&*self.pool)
                .await?;
            Ok(count as u64)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query("SELECT 1").fetch_one(&*self.pool).await?;
            Ok(())
        })
    }
}
