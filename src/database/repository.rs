use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::manager::DatabaseManager;
use super::query_builder::{bind_query_value, bind_value, QueryBuilder};
use super::store::{Record, Store, StoreError};
use crate::filter::{FieldValue, Filter, SqlResult};
use crate::resources::Resource;

/// Postgres-backed store; every statement is parameterized
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_rows(&self, resource: &Resource, sql: SqlResult) -> Result<Vec<Record>, StoreError> {
        let mut q = sqlx::query_scalar::<_, Value>(&sql.query);
        for param in &sql.params {
            q = bind_value(q, param);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(resource, e))?;

        rows.into_iter()
            .map(|row| match row {
                Value::Object(record) => Ok(resource.normalize(record)),
                other => Err(StoreError::Query(format!("expected a JSON object row, got {}", other))),
            })
            .collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_all(&self, resource: &Resource, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let sql = filter.to_sql()?;
        self.fetch_rows(resource, sql).await
    }

    async fn find_by_id(&self, resource: &Resource, id: i64) -> Result<Option<Record>, StoreError> {
        let filter = Filter::new(resource)?.where_equals(resource, resource.primary_key, FieldValue::Integer(id))?;
        Ok(self.find_all(resource, &filter).await?.into_iter().next())
    }

    async fn create(&self, resource: &Resource, record: Record) -> Result<Record, StoreError> {
        let sql = QueryBuilder::new(resource).insert(&record)?;
        self.fetch_rows(resource, sql)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Query(format!("INSERT into {} returned no row", resource.table)))
    }

    async fn update(&self, resource: &Resource, id: i64, changes: Record) -> Result<Option<Record>, StoreError> {
        let sql = QueryBuilder::new(resource).update(id, &changes)?;
        Ok(self.fetch_rows(resource, sql).await?.into_iter().next())
    }

    async fn delete(&self, resource: &Resource, id: i64) -> Result<bool, StoreError> {
        let sql = QueryBuilder::new(resource).delete(id);
        let mut q = sqlx::query(&sql.query);
        for param in &sql.params {
            q = bind_query_value(q, param);
        }

        let result = q
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(resource, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

/// Constraint violations become client errors; connectivity failures become `Unavailable`
fn map_sqlx_error(resource: &Resource, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(format!("{} already exists", resource.label));
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::InvalidReference(format!("{} references a record that does not exist", resource.label));
        }
        if db_err.is_check_violation() {
            return StoreError::InvalidValue {
                column: db_err.constraint().unwrap_or(resource.table).to_string(),
                reason: "value is out of range".to_string(),
            };
        }
        if matches!(db_err.kind(), sqlx::error::ErrorKind::NotNullViolation) {
            let column = db_err
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg| pg.column())
                .unwrap_or(resource.table);
            return StoreError::InvalidValue {
                column: column.to_string(),
                reason: "is required".to_string(),
            };
        }
    }

    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Sqlx(other),
    }
}
