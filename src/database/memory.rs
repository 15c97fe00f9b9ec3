use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::store::{Record, Store, StoreError};
use crate::filter::{FieldValue, Filter, FilterSpec, SortDirection, SortSpec, ValueType};
use crate::resources::Resource;

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

/// In-process store evaluating the same filter and sort specs as the SQL backend.
/// Backs the test suite and `serve --memory`; foreign keys are not enforced.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> Value {
        FieldValue::Timestamp(Utc::now()).to_json()
    }

    fn matches(resource: &Resource, spec: &FilterSpec, record: &Record) -> bool {
        spec.conditions().iter().all(|condition| {
            let value_type = resource
                .column(condition.column)
                .map(|c| c.value)
                .unwrap_or(ValueType::Text);
            let stored = record.get(condition.column).unwrap_or(&Value::Null);
            condition.predicate.matches(value_type, stored)
        })
    }

    /// Nulls sort as the largest value, as Postgres does
    fn compare(resource: &Resource, order: &SortSpec, a: &Record, b: &Record) -> Ordering {
        let value_type = resource
            .column(order.column)
            .map(|c| c.value)
            .unwrap_or(ValueType::Text);
        let read = |record: &Record| {
            record
                .get(order.column)
                .and_then(|v| value_type.from_json(v))
                .unwrap_or(FieldValue::Null)
        };

        let ordering = match (read(a), read(b)) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Greater,
            (_, FieldValue::Null) => Ordering::Less,
            (left, right) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        };

        match order.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    fn check_unique(resource: &Resource, table: &Table, record: &Record, skip_id: Option<i64>) -> Result<(), StoreError> {
        for column in resource.unique {
            let Some(candidate) = record.get(*column).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = table
                .rows
                .iter()
                .filter(|(id, _)| Some(**id) != skip_id)
                .any(|(_, row)| row.get(*column) == Some(candidate));
            if taken {
                return Err(StoreError::Conflict(format!("{}.{} already exists", resource.table, column)));
            }
        }
        Ok(())
    }

    fn check_columns(resource: &Resource, record: &Record) -> Result<(), StoreError> {
        for (key, value) in record {
            let column = resource.column(key).ok_or_else(|| StoreError::InvalidValue {
                column: key.clone(),
                reason: "unknown column".to_string(),
            })?;
            if column.value.from_json(value).is_none() {
                return Err(StoreError::InvalidValue {
                    column: key.clone(),
                    reason: format!("expected {}", column.value.expected()),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_all(&self, resource: &Resource, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(resource.table) else {
            return Ok(vec![]);
        };

        let mut rows: Vec<Record> = table
            .rows
            .values()
            .filter(|row| Self::matches(resource, filter.spec(), row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| Self::compare(resource, filter.order(), a, b));
        Ok(rows)
    }

    async fn find_by_id(&self, resource: &Resource, id: i64) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(resource.table).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn create(&self, resource: &Resource, record: Record) -> Result<Record, StoreError> {
        Self::check_columns(resource, &record)?;

        let mut tables = self.tables.write().await;
        let table = tables.entry(resource.table).or_default();
        Self::check_unique(resource, table, &record, None)?;

        table.next_id += 1;
        let id = table.next_id;
        let now = Self::now();

        let mut row = Record::new();
        for column in resource.columns {
            row.insert(column.name.to_string(), Value::Null);
        }
        row.extend(record);
        row.insert(resource.primary_key.to_string(), Value::from(id));
        for stamp in ["createdAt", "updatedAt"] {
            if resource.column(stamp).is_some() {
                row.insert(stamp.to_string(), now.clone());
            }
        }

        let row = resource.normalize(row);
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, resource: &Resource, id: i64, changes: Record) -> Result<Option<Record>, StoreError> {
        Self::check_columns(resource, &changes)?;

        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(resource.table) else {
            return Ok(None);
        };
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        Self::check_unique(resource, table, &changes, Some(id))?;

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.extend(changes);
        if resource.column("updatedAt").is_some() {
            row.insert("updatedAt".to_string(), Self::now());
        }
        *row = resource.normalize(std::mem::take(row));
        Ok(Some(row.clone()))
    }

    async fn delete(&self, resource: &Resource, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .get_mut(resource.table)
            .map(|t| t.rows.remove(&id).is_some())
            .unwrap_or(false))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{CUSTOMERS, PRODUCTS};
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (name, price, stock) in [("Desk lamp", "25.00", 3), ("Chair", "80.00", 0), ("Lamp shade", "12.50", 7)] {
            store
                .create(&PRODUCTS, record(json!({ "name": name, "price": price, "stock": stock })))
                .await
                .unwrap();
        }
        store
    }

    fn names(rows: &[Record]) -> Vec<&str> {
        rows.iter().map(|r| r["name"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn create_assigns_ids_and_timestamps() {
        let store = MemoryStore::new();
        let first = store.create(&PRODUCTS, record(json!({ "name": "Lamp" }))).await.unwrap();
        let second = store.create(&PRODUCTS, record(json!({ "name": "Desk" }))).await.unwrap();

        assert_eq!(first["prodId"], 1);
        assert_eq!(second["prodId"], 2);
        assert!(first["createdAt"].is_string());
        assert!(first["image"].is_null());
    }

    #[tokio::test]
    async fn filters_by_range_and_substring() {
        let store = seeded().await;
        let filter = Filter::from_query(
            &PRODUCTS,
            &query(&[("minPrice", "10"), ("maxPrice", "50"), ("name", "LAMP"), ("sortBy", "price")]),
        )
        .unwrap();
        let rows = store.find_all(&PRODUCTS, &filter).await.unwrap();
        assert_eq!(names(&rows), vec!["Lamp shade", "Desk lamp"]);
    }

    #[tokio::test]
    async fn in_stock_excludes_zero() {
        let store = seeded().await;
        let filter = Filter::from_query(&PRODUCTS, &query(&[("inStock", "true"), ("sortBy", "stock"), ("sortOrder", "desc")])).unwrap();
        let rows = store.find_all(&PRODUCTS, &filter).await.unwrap();
        assert_eq!(names(&rows), vec!["Lamp shade", "Desk lamp"]);
    }

    #[tokio::test]
    async fn nulls_sort_last_ascending() {
        let store = seeded().await;
        store.create(&PRODUCTS, record(json!({ "name": "Mystery" }))).await.unwrap();
        let filter = Filter::from_query(&PRODUCTS, &query(&[("sortBy", "price")])).unwrap();
        let rows = store.find_all(&PRODUCTS, &filter).await.unwrap();
        assert_eq!(names(&rows).last(), Some(&"Mystery"));
    }

    #[tokio::test]
    async fn unique_columns_conflict() {
        let store = MemoryStore::new();
        let account = json!({ "name": "Ada", "email": "ada@example.com", "password": "h", "role": "customer" });
        store.create(&CUSTOMERS, record(account.clone())).await.unwrap();
        let err = store.create(&CUSTOMERS, record(account)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store
            .find_one_by(&CUSTOMERS, "email", FieldValue::Text("ada@example.com".to_string()))
            .await
            .unwrap();
        assert_eq!(found.unwrap()["custId"], 1);
    }

    #[tokio::test]
    async fn update_and_delete_missing_rows() {
        let store = seeded().await;
        let updated = store.update(&PRODUCTS, 1, record(json!({ "stock": 9 }))).await.unwrap().unwrap();
        assert_eq!(updated["stock"], 9);
        assert_eq!(updated["name"], "Desk lamp");

        assert!(store.update(&PRODUCTS, 99, record(json!({ "stock": 1 }))).await.unwrap().is_none());
        assert!(store.delete(&PRODUCTS, 1).await.unwrap());
        assert!(!store.delete(&PRODUCTS, 1).await.unwrap());
        assert!(store.find_by_id(&PRODUCTS, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_mistyped_values() {
        let store = MemoryStore::new();
        let err = store
            .create(&PRODUCTS, record(json!({ "name": "Lamp", "stock": "lots" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { ref column, .. } if column == "stock"));
    }
}
