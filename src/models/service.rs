use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validate::{self, char_len_between, is_money, FieldErrors};
use super::{to_record, NewRecord};
use crate::database::Record;
use crate::resources::{Resource, SERVICES};

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration: Option<i64>,
}

impl NewRecord for Service {
    fn resource() -> &'static Resource {
        &SERVICES
    }

    fn validate(&self, errors: &mut FieldErrors) {
        errors.check(char_len_between(&self.name, 3, 100), "name", "must be 3 to 100 characters");
        if let Some(description) = &self.description {
            errors.check(char_len_between(description, 0, 500), "description", "must be at most 500 characters");
        }
        errors.check(is_money(&self.price), "price", "must be positive with at most 2 decimals");
        if let Some(duration) = self.duration {
            errors.check(duration > 0, "duration", "must be a positive integer");
        }
    }

    fn into_record(self) -> Record {
        to_record(&self)
    }

    fn validate_changes(changes: &Record, errors: &mut FieldErrors) {
        if let Some(name) = changes.get("name") {
            let ok = name.as_str().map_or(false, |n| char_len_between(n, 3, 100));
            errors.check(ok, "name", "must be 3 to 100 characters");
        }
        match validate::decimal_change(changes, "price") {
            Some(Some(price)) => errors.check(is_money(&price), "price", "must be positive with at most 2 decimals"),
            Some(None) => errors.add("price", "is required"),
            None => {}
        }
        if let Some(Some(duration)) = validate::integer_change(changes, "duration") {
            errors.check(duration > 0, "duration", "must be a positive integer");
        }
    }
}
