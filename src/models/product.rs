use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validate::{self, alphanumeric_and_spaces, char_len_between, is_money, letters_and_spaces, FieldErrors};
use super::{to_record, NewRecord};
use crate::database::Record;
use crate::resources::{Resource, PRODUCTS};

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    pub name: String,
    pub desc: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
}

fn check_name(errors: &mut FieldErrors, name: &str) {
    errors.check(char_len_between(name, 3, 30), "name", "must be 3 to 30 characters");
    errors.check(letters_and_spaces(name), "name", "may only contain letters and spaces");
}

fn check_desc(errors: &mut FieldErrors, desc: &str) {
    errors.check(char_len_between(desc, 10, 255), "desc", "must be 10 to 255 characters");
    errors.check(alphanumeric_and_spaces(desc), "desc", "may only contain letters, digits and spaces");
}

impl NewRecord for Product {
    fn resource() -> &'static Resource {
        &PRODUCTS
    }

    fn validate(&self, errors: &mut FieldErrors) {
        check_name(errors, &self.name);
        if let Some(desc) = &self.desc {
            check_desc(errors, desc);
        }
        if let Some(image) = &self.image {
            errors.check(validate::is_uri(image), "image", "must be a valid URI");
        }
        if let Some(price) = &self.price {
            errors.check(is_money(price), "price", "must be positive with at most 2 decimals");
        }
        if let Some(stock) = self.stock {
            errors.check(stock > 0, "stock", "must be a positive integer");
        }
    }

    fn into_record(self) -> Record {
        to_record(&self)
    }

    fn validate_changes(changes: &Record, errors: &mut FieldErrors) {
        if let Some(name) = changes.get("name") {
            match name.as_str() {
                Some(name) => check_name(errors, name),
                None => errors.add("name", "is required"),
            }
        }
        if let Some(Some(price)) = validate::decimal_change(changes, "price") {
            errors.check(is_money(&price), "price", "must be positive with at most 2 decimals");
        }
        if let Some(Some(stock)) = validate::integer_change(changes, "stock") {
            errors.check(stock >= 0, "stock", "must not be negative");
        }
    }
}
