use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::validate::{self, is_money, FieldErrors};
use super::NewRecord;
use crate::database::Record;
use crate::filter::FieldValue;
use crate::resources::{Resource, ORDERS};

pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Order {
    pub cust_id: i64,
    pub prod_id: i64,
    pub quantity: i64,
    pub total_amount: Decimal,
}

impl NewRecord for Order {
    fn resource() -> &'static Resource {
        &ORDERS
    }

    fn validate(&self, errors: &mut FieldErrors) {
        errors.check(self.cust_id > 0, "custId", "must be a positive integer");
        errors.check(self.prod_id > 0, "prodId", "must be a positive integer");
        errors.check(self.quantity > 0, "quantity", "must be a positive integer");
        errors.check(is_money(&self.total_amount), "totalAmount", "must be positive with at most 2 decimals");
    }

    fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert("custId".into(), Value::from(self.cust_id));
        record.insert("prodId".into(), Value::from(self.prod_id));
        record.insert("quantity".into(), Value::from(self.quantity));
        record.insert("totalAmount".into(), FieldValue::Decimal(self.total_amount).to_json());
        record.insert("status".into(), Value::from(DEFAULT_STATUS));
        record.insert("orderDate".into(), FieldValue::Timestamp(Utc::now()).to_json());
        record
    }

    fn validate_changes(changes: &Record, errors: &mut FieldErrors) {
        validate::id_change(changes, errors, "custId");
        validate::id_change(changes, errors, "prodId");
        validate::text_change(changes, errors, "status");
        validate::not_null_change(changes, errors, "orderDate");
        match validate::integer_change(changes, "quantity") {
            Some(Some(quantity)) => errors.check(quantity > 0, "quantity", "must be a positive integer"),
            Some(None) => errors.add("quantity", "is required"),
            None => {}
        }
        match validate::decimal_change(changes, "totalAmount") {
            Some(Some(total)) => errors.check(is_money(&total), "totalAmount", "must be positive with at most 2 decimals"),
            Some(None) => errors.add("totalAmount", "is required"),
            None => {}
        }
    }
}
