use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

/// Storage type of a filterable or sortable column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Decimal,
    Timestamp,
}

impl ValueType {
    /// Human readable expectation used in validation messages
    pub fn expected(&self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Integer => "an integer",
            ValueType::Decimal => "a decimal number",
            ValueType::Timestamp => "a date (YYYY-MM-DD) or RFC 3339 date-time",
        }
    }

    /// Parse a raw query-string value
    pub fn parse_param(&self, raw: &str) -> Option<FieldValue> {
        let raw = raw.trim();
        match self {
            ValueType::Text => Some(FieldValue::Text(raw.to_string())),
            ValueType::Integer => raw.parse::<i64>().ok().map(FieldValue::Integer),
            ValueType::Decimal => Decimal::from_str(raw).ok().map(FieldValue::Decimal),
            ValueType::Timestamp => parse_timestamp(raw).map(FieldValue::Timestamp),
        }
    }

    /// Read a stored or submitted JSON value; numbers may arrive as strings and vice versa
    pub fn from_json(&self, value: &Value) -> Option<FieldValue> {
        if value.is_null() {
            return Some(FieldValue::Null);
        }
        match (self, value) {
            (ValueType::Text, Value::String(s)) => Some(FieldValue::Text(s.clone())),
            (ValueType::Integer, Value::Number(n)) => n.as_i64().map(FieldValue::Integer),
            (ValueType::Integer, Value::String(s)) => s.trim().parse().ok().map(FieldValue::Integer),
            (ValueType::Decimal, Value::Number(n)) => {
                Decimal::from_str(&n.to_string())
                    .or_else(|_| Decimal::from_scientific(&n.to_string()))
                    .ok()
                    .map(FieldValue::Decimal)
            }
            (ValueType::Decimal, Value::String(s)) => Decimal::from_str(s.trim()).ok().map(FieldValue::Decimal),
            (ValueType::Timestamp, Value::String(s)) => parse_timestamp(s).map(FieldValue::Timestamp),
            _ => None,
        }
    }
}

/// RFC 3339 date-time, or a bare `YYYY-MM-DD` taken as midnight UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// A typed value ready to be bound as a SQL parameter or compared in memory
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Decimal(d) => Value::String(d.to_string()),
            FieldValue::Timestamp(t) => Value::String(t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl PartialOrd for FieldValue {
    /// Values of different kinds are unordered
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Some(Ordering::Equal),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.partial_cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.partial_cmp(b),
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => a.partial_cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// How one whitelisted column is driven from the query string
#[derive(Debug, Clone, Copy)]
pub enum FilterKind {
    /// `?param=v` gives `column = v`
    Exact { param: &'static str, value: ValueType },
    /// `?min=a&max=b` gives `column >= a AND column <= b`, either side optional
    Range { min: &'static str, max: &'static str, value: ValueType },
    /// `?param=v` gives a case-insensitive substring match
    Contains { param: &'static str },
    /// `?param=true` gives `column > 0`; `false` adds nothing
    Positive { param: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub column: &'static str,
    pub kind: FilterKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(FieldValue),
    Range {
        gte: Option<FieldValue>,
        lte: Option<FieldValue>,
    },
    /// Raw needle; escaping happens when the predicate is rendered
    Contains(String),
    Positive,
}

impl Predicate {
    /// Evaluate against a stored JSON value of the given column type
    pub fn matches(&self, value_type: ValueType, stored: &Value) -> bool {
        match self {
            Predicate::Equals(expected) => match value_type.from_json(stored) {
                Some(FieldValue::Null) | None => false,
                Some(actual) => actual.partial_cmp(expected) == Some(Ordering::Equal),
            },
            Predicate::Range { gte, lte } => {
                let actual = match value_type.from_json(stored) {
                    Some(FieldValue::Null) | None => return false,
                    Some(actual) => actual,
                };
                let above = gte.as_ref().map_or(true, |min| {
                    matches!(actual.partial_cmp(min), Some(Ordering::Greater | Ordering::Equal))
                });
                let below = lte.as_ref().map_or(true, |max| {
                    matches!(actual.partial_cmp(max), Some(Ordering::Less | Ordering::Equal))
                });
                above && below
            }
            Predicate::Contains(needle) => stored
                .as_str()
                .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            Predicate::Positive => match ValueType::Decimal.from_json(stored) {
                Some(FieldValue::Decimal(d)) => d > Decimal::ZERO,
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column: &'static str,
    pub predicate: Predicate,
}

/// Conditions in whitelist order, at most one per column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    conditions: Vec<FilterCondition>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any existing condition on the same column
    pub fn push(&mut self, column: &'static str, predicate: Predicate) {
        self.conditions.retain(|c| c.column != column);
        self.conditions.push(FilterCondition { column, predicate });
    }

    pub fn get(&self, column: &str) -> Option<&Predicate> {
        self.conditions
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.predicate)
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `DESC` only on a case-insensitive "desc"
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Sortable whitelist of a resource plus its fallback ordering
#[derive(Debug, Clone, Copy)]
pub struct SortSchema {
    pub fields: &'static [&'static str],
    pub default: SortSpec,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FieldValue>,
}
