use std::collections::HashMap;

use super::types::{SortDirection, SortSchema, SortSpec};

pub const SORT_BY_PARAM: &str = "sortBy";
pub const SORT_ORDER_PARAM: &str = "sortOrder";

pub struct FilterOrder;

impl FilterOrder {
    /// Resolve a requested ordering against the whitelist. Never fails: an absent or
    /// unlisted field falls back to the resource default.
    pub fn resolve(sort_by: Option<&str>, sort_order: Option<&str>, schema: &SortSchema) -> SortSpec {
        let requested = sort_by.map(str::trim).filter(|s| !s.is_empty());

        match requested.and_then(|name| schema.fields.iter().copied().find(|f| *f == name)) {
            Some(column) => SortSpec {
                column,
                direction: SortDirection::parse(sort_order),
            },
            None => {
                if let Some(name) = requested {
                    tracing::debug!("Ignoring unsortable field '{}'", name);
                }
                schema.default
            }
        }
    }

    pub fn from_query(query: &HashMap<String, String>, schema: &SortSchema) -> SortSpec {
        Self::resolve(
            query.get(SORT_BY_PARAM).map(String::as_str),
            query.get(SORT_ORDER_PARAM).map(String::as_str),
            schema,
        )
    }

    pub fn generate(spec: &SortSpec) -> String {
        format!("ORDER BY \"{}\" {}", spec.column, spec.direction.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: SortSchema = SortSchema {
        fields: &["name", "price", "stock", "createdAt"],
        default: SortSpec { column: "createdAt", direction: SortDirection::Desc },
    };

    #[test]
    fn listed_field_with_direction() {
        let spec = FilterOrder::resolve(Some("price"), Some("DESC"), &SCHEMA);
        assert_eq!(spec, SortSpec { column: "price", direction: SortDirection::Desc });

        let spec = FilterOrder::resolve(Some("name"), Some("sideways"), &SCHEMA);
        assert_eq!(spec, SortSpec { column: "name", direction: SortDirection::Asc });
    }

    #[test]
    fn unknown_field_falls_back_to_default() {
        let spec = FilterOrder::resolve(Some("unknownField"), Some("asc"), &SCHEMA);
        assert_eq!(spec, SCHEMA.default);

        let spec = FilterOrder::resolve(Some("price\" DESC; --"), None, &SCHEMA);
        assert_eq!(spec, SCHEMA.default);
    }

    #[test]
    fn absent_field_uses_default() {
        assert_eq!(FilterOrder::resolve(None, Some("asc"), &SCHEMA), SCHEMA.default);
        assert_eq!(FilterOrder::from_query(&HashMap::new(), &SCHEMA), SCHEMA.default);
    }

    #[test]
    fn field_names_are_case_sensitive() {
        assert_eq!(FilterOrder::resolve(Some("PRICE"), None, &SCHEMA), SCHEMA.default);
    }

    #[test]
    fn generates_quoted_order_clause() {
        let spec = FilterOrder::resolve(Some("createdAt"), Some("desc"), &SCHEMA);
        assert_eq!(FilterOrder::generate(&spec), "ORDER BY \"createdAt\" DESC");
    }
}
