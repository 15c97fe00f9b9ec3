use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryScalar;

use super::store::{Record, StoreError};
use crate::filter::{FieldValue, SqlResult};
use crate::resources::Resource;

/// Write statements for one resource. Every statement yields its row as a single
/// `row_to_json` column so reads and writes decode the same way.
pub struct QueryBuilder<'r> {
    resource: &'r Resource,
}

impl<'r> QueryBuilder<'r> {
    pub fn new(resource: &'r Resource) -> Self {
        Self { resource }
    }

    /// Null values are left to column defaults
    pub fn insert(&self, record: &Record) -> Result<SqlResult, StoreError> {
        let mut columns = vec![];
        let mut placeholders = vec![];
        let mut params = vec![];

        for (key, value) in record {
            let typed = self.typed(key, value)?;
            if typed == FieldValue::Null {
                continue;
            }
            params.push(typed);
            columns.push(format!("\"{}\"", key));
            placeholders.push(format!("${}", params.len()));
        }

        let insert = if columns.is_empty() {
            format!("INSERT INTO \"{}\" DEFAULT VALUES RETURNING *", self.resource.table)
        } else {
            format!(
                "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
                self.resource.table,
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        Ok(SqlResult {
            query: format!("WITH inserted AS ({}) SELECT row_to_json(inserted) AS row FROM inserted", insert),
            params,
        })
    }

    /// Null values clear the column; `updatedAt` is always refreshed
    pub fn update(&self, id: i64, changes: &Record) -> Result<SqlResult, StoreError> {
        let mut assignments = vec![];
        let mut params = vec![];

        for (key, value) in changes {
            match self.typed(key, value)? {
                FieldValue::Null => assignments.push(format!("\"{}\" = NULL", key)),
                typed => {
                    params.push(typed);
                    assignments.push(format!("\"{}\" = ${}", key, params.len()));
                }
            }
        }
        if self.resource.column("updatedAt").is_some() {
            assignments.push("\"updatedAt\" = NOW()".to_string());
        }
        if assignments.is_empty() {
            return Err(StoreError::Query("UPDATE with no assignments".to_string()));
        }

        params.push(FieldValue::Integer(id));
        let update = format!(
            "UPDATE \"{}\" SET {} WHERE \"{}\" = ${} RETURNING *",
            self.resource.table,
            assignments.join(", "),
            self.resource.primary_key,
            params.len()
        );

        Ok(SqlResult {
            query: format!("WITH updated AS ({}) SELECT row_to_json(updated) AS row FROM updated", update),
            params,
        })
    }

    pub fn delete(&self, id: i64) -> SqlResult {
        SqlResult {
            query: format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = $1",
                self.resource.table, self.resource.primary_key
            ),
            params: vec![FieldValue::Integer(id)],
        }
    }

    fn typed(&self, key: &str, value: &serde_json::Value) -> Result<FieldValue, StoreError> {
        let column = self.resource.column(key).ok_or_else(|| StoreError::InvalidValue {
            column: key.to_string(),
            reason: "unknown column".to_string(),
        })?;
        column.value.from_json(value).ok_or_else(|| StoreError::InvalidValue {
            column: key.to_string(),
            reason: format!("expected {}", column.value.expected()),
        })
    }
}

/// Bind one typed parameter; nulls never reach here as a typed value
pub fn bind_value<'q, O>(
    q: QueryScalar<'q, Postgres, O, PgArguments>,
    value: &FieldValue,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    match value {
        FieldValue::Null => q.bind(None::<String>),
        FieldValue::Text(s) => q.bind(s.clone()),
        FieldValue::Integer(i) => q.bind(*i),
        FieldValue::Decimal(d) => q.bind(*d),
        FieldValue::Timestamp(t) => q.bind(*t),
    }
}

pub fn bind_query_value<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    value: &FieldValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match value {
        FieldValue::Null => q.bind(None::<String>),
        FieldValue::Text(s) => q.bind(s.clone()),
        FieldValue::Integer(i) => q.bind(*i),
        FieldValue::Decimal(d) => q.bind(*d),
        FieldValue::Timestamp(t) => q.bind(*t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{ORDERS, PRODUCTS};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn insert_skips_nulls() {
        let sql = QueryBuilder::new(&PRODUCTS)
            .insert(&record(json!({ "name": "Lamp", "image": null, "price": "9.99" })))
            .unwrap();
        assert_eq!(
            sql.query,
            "WITH inserted AS (INSERT INTO \"products\" (\"name\", \"price\") VALUES ($1, $2) RETURNING *) \
             SELECT row_to_json(inserted) AS row FROM inserted"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn update_sets_nulls_and_touches_updated_at() {
        let sql = QueryBuilder::new(&PRODUCTS)
            .update(4, &record(json!({ "image": null, "stock": 2 })))
            .unwrap();
        assert!(sql.query.contains("SET \"image\" = NULL, \"stock\" = $1, \"updatedAt\" = NOW() WHERE \"prodId\" = $2"));
        assert_eq!(sql.params, vec![FieldValue::Integer(2), FieldValue::Integer(4)]);
    }

    #[test]
    fn delete_by_primary_key() {
        let sql = QueryBuilder::new(&ORDERS).delete(3);
        assert_eq!(sql.query, "DELETE FROM \"orders\" WHERE \"orderId\" = $1");
    }

    #[test]
    fn rejects_unknown_columns_and_bad_types() {
        let builder = QueryBuilder::new(&PRODUCTS);
        assert!(matches!(
            builder.insert(&record(json!({ "name\"; --": "x" }))),
            Err(StoreError::InvalidValue { .. })
        ));
        assert!(matches!(
            builder.insert(&record(json!({ "price": "free" }))),
            Err(StoreError::InvalidValue { .. })
        ));
    }
}
