use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ApiError;
use crate::filter::{FieldValue, ValueType};

/// Collects per-field problems so a client sees every failure at once
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// First problem per field wins
    pub fn add(&mut self, field: &str, problem: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| problem.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, problem: &str) {
        if !ok {
            self.add(field, problem);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.errors)))
        }
    }
}

pub fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

pub fn letters_and_spaces(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
}

pub fn alphanumeric_and_spaces(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
}

/// Positive with at most two decimal places
pub fn is_money(value: &Decimal) -> bool {
    *value > Decimal::ZERO && value.normalize().scale() <= 2
}

pub fn is_uri(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

/// Read a numeric column out of a partial update body
pub fn decimal_change(changes: &serde_json::Map<String, Value>, field: &str) -> Option<Option<Decimal>> {
    changes.get(field).map(|v| match ValueType::Decimal.from_json(v) {
        Some(FieldValue::Decimal(d)) => Some(d),
        _ => None,
    })
}

pub fn integer_change(changes: &serde_json::Map<String, Value>, field: &str) -> Option<Option<i64>> {
    changes.get(field).map(|v| match ValueType::Integer.from_json(v) {
        Some(FieldValue::Integer(i)) => Some(i),
        _ => None,
    })
}

/// Foreign-key ids in a partial update must stay positive integers
pub fn id_change(changes: &serde_json::Map<String, Value>, errors: &mut FieldErrors, field: &str) {
    if let Some(id) = integer_change(changes, field) {
        errors.check(id.map_or(false, |id| id > 0), field, "must be a positive integer");
    }
}

/// Text columns that may be changed but never cleared
pub fn text_change(changes: &serde_json::Map<String, Value>, errors: &mut FieldErrors, field: &str) {
    if let Some(value) = changes.get(field) {
        let ok = value.as_str().map_or(false, |s| !s.trim().is_empty());
        errors.check(ok, field, "must be a non-empty string");
    }
}

/// Rejects an explicit null for a NOT NULL column
pub fn not_null_change(changes: &serde_json::Map<String, Value>, errors: &mut FieldErrors, field: &str) {
    if changes.get(field).map_or(false, Value::is_null) {
        errors.add(field, "is required");
    }
}
