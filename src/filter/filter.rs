use std::collections::HashMap;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FieldValue, FilterSpec, Predicate, SortSpec, SqlResult};
use crate::resources::Resource;

/// A validated list query for one resource: predicates plus a single ordering
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: &'static str,
    spec: FilterSpec,
    order: SortSpec,
}

impl Filter {
    /// Match everything, in the resource's default order
    pub fn new(resource: &Resource) -> Result<Self, FilterError> {
        Self::validate_identifier(resource.table).map_err(FilterError::InvalidTableName)?;
        Ok(Self {
            table_name: resource.table,
            spec: FilterSpec::new(),
            order: resource.sort.default,
        })
    }

    /// Build from untrusted query parameters through the resource whitelists
    pub fn from_query(resource: &Resource, query: &HashMap<String, String>) -> Result<Self, FilterError> {
        let mut filter = Self::new(resource)?;
        filter.spec = FilterWhere::build(resource.filters, query)?;
        filter.order = FilterOrder::from_query(query, &resource.sort);
        Ok(filter)
    }

    /// Pin an equality condition, e.g. a path parameter; `column` must be a resource column
    pub fn where_equals(mut self, resource: &Resource, column: &str, value: FieldValue) -> Result<Self, FilterError> {
        let column = resource
            .column(column)
            .ok_or_else(|| FilterError::InvalidColumn(format!("{}.{}", resource.table, column)))?;
        self.spec.push(column.name, Predicate::Equals(value));
        Ok(self)
    }

    pub fn order_by(mut self, order: SortSpec) -> Self {
        self.order = order;
        self
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn order(&self) -> &SortSpec {
        &self.order
    }

    /// Rows come back as a single JSON column named `row`
    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        for condition in self.spec.conditions() {
            Self::validate_identifier(condition.column).map_err(FilterError::InvalidColumn)?;
        }
        Self::validate_identifier(self.order.column).map_err(FilterError::InvalidColumn)?;

        let (where_clause, params) = FilterWhere::generate(&self.spec, 0);
        let order_clause = FilterOrder::generate(&self.order);

        let query = [
            "SELECT row_to_json(t) AS row".to_string(),
            format!("FROM \"{}\" t", self.table_name),
            format!("WHERE {}", where_clause),
            order_clause,
        ]
        .join(" ");

        Ok(SqlResult { query, params })
    }

    /// Identifiers are interpolated into SQL, so only plain ASCII words pass
    fn validate_identifier(name: &str) -> Result<(), String> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if valid {
            Ok(())
        } else {
            Err(format!("Invalid identifier format: {:?}", name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{SortDirection, ValueType};
    use crate::resources::{ORDERS, PRODUCTS, REVIEWS};

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn default_list_query() {
        let sql = Filter::new(&PRODUCTS).unwrap().to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM \"products\" t WHERE 1=1 ORDER BY \"createdAt\" DESC"
        );
        assert!(sql.params.is_empty());
    }

    #[test]
    fn filtered_and_sorted_list_query() {
        let filter = Filter::from_query(
            &PRODUCTS,
            &query(&[("minPrice", "10"), ("maxPrice", "50"), ("sortBy", "price"), ("sortOrder", "asc")]),
        )
        .unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM \"products\" t WHERE \"price\" >= $1 AND \"price\" <= $2 ORDER BY \"price\" ASC"
        );
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn orders_default_to_order_date() {
        let filter = Filter::from_query(&ORDERS, &query(&[("sortBy", "password")])).unwrap();
        assert_eq!(filter.order().column, "orderDate");
        assert_eq!(filter.order().direction, SortDirection::Desc);
    }

    #[test]
    fn where_equals_requires_a_known_column() {
        let filter = Filter::new(&REVIEWS)
            .unwrap()
            .where_equals(&REVIEWS, "serviceId", FieldValue::Integer(4))
            .unwrap();
        assert_eq!(filter.spec().get("serviceId"), Some(&Predicate::Equals(FieldValue::Integer(4))));

        let err = Filter::new(&REVIEWS)
            .unwrap()
            .where_equals(&REVIEWS, "1=1; --", FieldValue::Integer(4))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn query_values_never_reach_sql_text() {
        let filter = Filter::from_query(&PRODUCTS, &query(&[("name", "'; DROP TABLE products; --")])).unwrap();
        let sql = filter.to_sql().unwrap();
        assert!(!sql.query.contains("DROP"));
        assert_eq!(sql.params.len(), 1);
        assert_eq!(ValueType::Text.from_json(&sql.params[0].to_json()), Some(sql.params[0].clone()));
    }
}
