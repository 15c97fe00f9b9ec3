use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::{FieldValue, Filter, FilterError};
use crate::resources::Resource;

/// A stored row keyed by camelCase column name
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique column collision, e.g. a second account with the same email
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A foreign key pointed at a missing row
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid value for {column}: {reason}")]
    InvalidValue { column: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl From<FilterError> for StoreError {
    fn from(err: FilterError) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// Persistence seam shared by the Postgres and in-memory backends
#[async_trait]
pub trait Store: Send + Sync {
    /// Rows matching `filter`, in its order
    async fn find_all(&self, resource: &Resource, filter: &Filter) -> Result<Vec<Record>, StoreError>;

    async fn find_by_id(&self, resource: &Resource, id: i64) -> Result<Option<Record>, StoreError>;

    /// Insert and return the stored row including generated columns
    async fn create(&self, resource: &Resource, record: Record) -> Result<Record, StoreError>;

    /// Apply `changes` to one row; `None` when the row does not exist
    async fn update(&self, resource: &Resource, id: i64, changes: Record) -> Result<Option<Record>, StoreError>;

    /// `false` when the row does not exist
    async fn delete(&self, resource: &Resource, id: i64) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_one_by(
        &self,
        resource: &Resource,
        column: &str,
        value: FieldValue,
    ) -> Result<Option<Record>, StoreError> {
        let filter = Filter::new(resource)?.where_equals(resource, column, value)?;
        Ok(self.find_all(resource, &filter).await?.into_iter().next())
    }
}
