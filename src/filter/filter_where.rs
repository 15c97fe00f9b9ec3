use std::collections::HashMap;

use super::error::FilterError;
use super::types::{FieldValue, FilterField, FilterKind, FilterSpec, Predicate, ValueType};

/// Turns whitelisted query parameters into a `FilterSpec` and renders specs as SQL
pub struct FilterWhere {
    param_values: Vec<FieldValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Read `query` through the whitelist. Parameters outside the whitelist are ignored
    /// and empty values contribute nothing.
    pub fn build(fields: &[FilterField], query: &HashMap<String, String>) -> Result<FilterSpec, FilterError> {
        let mut spec = FilterSpec::new();

        for field in fields {
            match field.kind {
                FilterKind::Exact { param, value } => {
                    if let Some(parsed) = Self::typed_param(query, param, value)? {
                        spec.push(field.column, Predicate::Equals(parsed));
                    }
                }
                FilterKind::Range { min, max, value } => {
                    let gte = Self::typed_param(query, min, value)?;
                    let lte = Self::typed_param(query, max, value)?;
                    if gte.is_some() || lte.is_some() {
                        spec.push(field.column, Predicate::Range { gte, lte });
                    }
                }
                FilterKind::Contains { param } => {
                    if let Some(needle) = Self::raw_param(query, param) {
                        spec.push(field.column, Predicate::Contains(needle.to_string()));
                    }
                }
                FilterKind::Positive { param } => match Self::raw_param(query, param) {
                    Some(flag) if flag.eq_ignore_ascii_case("true") => {
                        spec.push(field.column, Predicate::Positive);
                    }
                    Some(flag) if flag.eq_ignore_ascii_case("false") => {}
                    Some(flag) => {
                        return Err(FilterError::InvalidValue {
                            param: param.to_string(),
                            value: flag.to_string(),
                            expected: "true or false",
                        })
                    }
                    None => {}
                },
            }
        }

        Ok(spec)
    }

    fn raw_param<'q>(query: &'q HashMap<String, String>, param: &str) -> Option<&'q str> {
        query
            .get(param)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn typed_param(
        query: &HashMap<String, String>,
        param: &str,
        value_type: ValueType,
    ) -> Result<Option<FieldValue>, FilterError> {
        let Some(raw) = Self::raw_param(query, param) else {
            return Ok(None);
        };

        value_type
            .parse_param(raw)
            .map(Some)
            .ok_or_else(|| FilterError::InvalidValue {
                param: param.to_string(),
                value: raw.to_string(),
                expected: value_type.expected(),
            })
    }

    /// Render `spec` as a WHERE body with `$n` placeholders numbered after `starting_param_index`
    pub fn generate(spec: &FilterSpec, starting_param_index: usize) -> (String, Vec<FieldValue>) {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = vec![];

        for condition in spec.conditions() {
            if let Some(sql) = filter_where.build_sql_condition(condition.column, &condition.predicate) {
                sql_conditions.push(sql);
            }
        }

        let where_clause = if sql_conditions.is_empty() {
            "1=1".to_string()
        } else {
            sql_conditions.join(" AND ")
        };
        (where_clause, filter_where.param_values)
    }

    fn build_sql_condition(&mut self, column: &str, predicate: &Predicate) -> Option<String> {
        let quoted_column = format!("\"{}\"", column);
        match predicate {
            Predicate::Equals(FieldValue::Null) => Some(format!("{} IS NULL", quoted_column)),
            Predicate::Equals(value) => Some(format!("{} = {}", quoted_column, self.param(value.clone()))),
            Predicate::Range { gte, lte } => {
                let mut parts = vec![];
                if let Some(min) = gte {
                    parts.push(format!("{} >= {}", quoted_column, self.param(min.clone())));
                }
                if let Some(max) = lte {
                    parts.push(format!("{} <= {}", quoted_column, self.param(max.clone())));
                }
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" AND "))
                }
            }
            Predicate::Contains(needle) => {
                let pattern = format!("%{}%", escape_like(needle));
                Some(format!("{} ILIKE {}", quoted_column, self.param(FieldValue::Text(pattern))))
            }
            Predicate::Positive => Some(format!("{} > 0", quoted_column)),
        }
    }

    fn param(&mut self, value: FieldValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Escape LIKE metacharacters so client input only ever matches literally
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const PRODUCT_FILTERS: &[FilterField] = &[
        FilterField {
            column: "price",
            kind: FilterKind::Range { min: "minPrice", max: "maxPrice", value: ValueType::Decimal },
        },
        FilterField { column: "name", kind: FilterKind::Contains { param: "name" } },
        FilterField { column: "stock", kind: FilterKind::Positive { param: "inStock" } },
        FilterField {
            column: "custId",
            kind: FilterKind::Exact { param: "custId", value: ValueType::Integer },
        },
    ];

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn builds_inclusive_price_range() {
        let spec = FilterWhere::build(PRODUCT_FILTERS, &query(&[("minPrice", "10"), ("maxPrice", "50")])).unwrap();
        assert_eq!(
            spec.get("price"),
            Some(&Predicate::Range {
                gte: Some(FieldValue::Decimal(Decimal::new(10, 0))),
                lte: Some(FieldValue::Decimal(Decimal::new(50, 0))),
            })
        );
    }

    #[test]
    fn no_price_params_means_no_price_predicate() {
        let spec = FilterWhere::build(PRODUCT_FILTERS, &query(&[("name", "lamp")])).unwrap();
        assert!(spec.get("price").is_none());
        assert_eq!(spec.get("name"), Some(&Predicate::Contains("lamp".to_string())));
    }

    #[test]
    fn one_sided_range() {
        let spec = FilterWhere::build(PRODUCT_FILTERS, &query(&[("maxPrice", "5.5")])).unwrap();
        assert_eq!(
            spec.get("price"),
            Some(&Predicate::Range { gte: None, lte: Some(FieldValue::Decimal(Decimal::new(55, 1))) })
        );
    }

    #[test]
    fn unknown_and_empty_params_are_ignored() {
        let spec = FilterWhere::build(
            PRODUCT_FILTERS,
            &query(&[("password", "x"), ("minPrice", ""), ("name", "  "), ("price; DROP TABLE", "1")]),
        )
        .unwrap();
        assert!(spec.is_empty());
    }

    #[test]
    fn in_stock_true_and_false() {
        let spec = FilterWhere::build(PRODUCT_FILTERS, &query(&[("inStock", "true")])).unwrap();
        assert_eq!(spec.get("stock"), Some(&Predicate::Positive));

        let spec = FilterWhere::build(PRODUCT_FILTERS, &query(&[("inStock", "false")])).unwrap();
        assert!(spec.get("stock").is_none());
    }

    #[test]
    fn invalid_value_names_the_parameter() {
        let err = FilterWhere::build(PRODUCT_FILTERS, &query(&[("minPrice", "cheap")])).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidValue {
                param: "minPrice".to_string(),
                value: "cheap".to_string(),
                expected: "a decimal number",
            }
        );

        let err = FilterWhere::build(PRODUCT_FILTERS, &query(&[("custId", "1 OR 1=1")])).unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { ref param, .. } if param == "custId"));

        let err = FilterWhere::build(PRODUCT_FILTERS, &query(&[("inStock", "yes")])).unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { ref param, .. } if param == "inStock"));
    }

    #[test]
    fn generates_parameterized_sql() {
        let spec = FilterWhere::build(
            PRODUCT_FILTERS,
            &query(&[("minPrice", "10"), ("maxPrice", "50"), ("name", "50%_off"), ("inStock", "true")]),
        )
        .unwrap();
        let (sql, params) = FilterWhere::generate(&spec, 0);

        assert_eq!(sql, "\"price\" >= $1 AND \"price\" <= $2 AND \"name\" ILIKE $3 AND \"stock\" > 0");
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], FieldValue::Text("%50\\%\\_off%".to_string()));
    }

    #[test]
    fn empty_spec_generates_tautology() {
        let (sql, params) = FilterWhere::generate(&FilterSpec::new(), 0);
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn placeholders_continue_from_offset() {
        let spec = FilterWhere::build(PRODUCT_FILTERS, &query(&[("custId", "7")])).unwrap();
        let (sql, _) = FilterWhere::generate(&spec, 2);
        assert_eq!(sql, "\"custId\" = $3");
    }
}
